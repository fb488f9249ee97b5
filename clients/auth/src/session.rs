//! Session management
//!
//! `SessionManager` is the single owner of the session. Screens, guards and
//! the API client only read it through the accessors or a watch
//! subscription; every mutation goes through the methods below and is
//! published as a `SessionSnapshot`.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::backend::AuthBackend;
use crate::error::{AuthError, AuthResult};
use crate::models::{AuthResponse, LoginCredentials, Registration, Session, TokenPair, User};
use crate::notify::{Notice, Notifier};
use crate::policy::{BootstrapStrategy, RefreshPolicy};
use crate::state::{AuthEvent, AuthPhase, SessionSnapshot};
use crate::storage::SessionStorage;
use crate::validation;

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

struct Inner {
    backend: Arc<dyn AuthBackend>,
    storage: Arc<dyn SessionStorage>,
    notifier: Arc<dyn Notifier>,
    policy: RefreshPolicy,
    session: RwLock<Session>,
    state: watch::Sender<SessionSnapshot>,
    // Serializes refreshes and the other token-replacing operations
    refresh_lock: Mutex<()>,
}

/// Session manager, cheap to clone and share
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a session manager and load whatever the storage holds
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        storage: Arc<dyn SessionStorage>,
        policy: RefreshPolicy,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let stored = storage.load();
        debug!(
            "Loaded stored session (access: {}, refresh: {}, user: {})",
            stored.access_token.is_some(),
            stored.refresh_token.is_some(),
            stored.user.is_some()
        );

        let snapshot = SessionSnapshot {
            phase: AuthPhase::Unauthenticated,
            user: stored.user.clone(),
            has_refresh_token: stored.refresh_token.is_some(),
            bootstrapped: false,
        };
        let (state, _) = watch::channel(snapshot);

        Self {
            inner: Arc::new(Inner {
                backend,
                storage,
                notifier,
                policy,
                session: RwLock::new(stored),
                state,
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    /// Policy in use
    pub fn policy(&self) -> &RefreshPolicy {
        &self.inner.policy
    }

    /// Current access token
    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    /// Current refresh token
    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    /// Cached user profile
    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// `Authorization` header value for the current access token
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token().map(|token| format!("Bearer {}", token))
    }

    /// Current phase
    pub fn phase(&self) -> AuthPhase {
        self.inner.state.borrow().phase
    }

    /// Current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Restore the stored session, once per app load
    pub async fn bootstrap(&self) -> AuthPhase {
        if !self.emit(AuthEvent::BootstrapStarted) {
            return self.phase();
        }

        match self.inner.policy.bootstrap {
            BootstrapStrategy::RefreshWithRetry => self.bootstrap_refresh().await,
            BootstrapStrategy::VerifyCurrentUser => self.bootstrap_verify().await,
        }

        self.inner.state.send_if_modified(|snapshot| {
            !std::mem::replace(&mut snapshot.bootstrapped, true)
        });

        let phase = self.phase();
        info!("Session bootstrap finished: {}", phase);
        phase
    }

    async fn bootstrap_refresh(&self) {
        let (refresh_token, has_user) = {
            let session = self.read();
            (session.refresh_token.clone(), session.user.is_some())
        };

        if refresh_token.is_none() {
            self.emit(AuthEvent::NothingToRestore);
            return;
        }

        if has_user {
            // Access token is renewed lazily on the first 401
            self.emit(AuthEvent::Restored);
            return;
        }

        let _guard = self.inner.refresh_lock.lock().await;
        let policy = &self.inner.policy;
        let mut attempt = 0;

        loop {
            attempt += 1;
            // Re-read each attempt: a failed profile fetch may follow a rotation
            let refresh_token = self.read().refresh_token.clone();
            let Some(refresh_token) = refresh_token else {
                self.emit(AuthEvent::NothingToRestore);
                return;
            };

            let result = match self.inner.backend.refresh(&refresh_token).await {
                Ok(response) => self.complete_refresh(response).await,
                Err(e) => Err(e),
            };

            let error = match result {
                Ok(()) => {
                    self.emit(AuthEvent::Restored);
                    return;
                }
                Err(e) => e,
            };

            if error.is_auth_rejection() {
                warn!("Bootstrap refresh rejected: {}", error);
                self.teardown(true);
                return;
            }

            if attempt >= policy.attempts() || !error.is_transient() {
                if policy.teardown.applies_to(&error) {
                    warn!("Bootstrap refresh failed, ending session: {}", error);
                    self.teardown(true);
                } else {
                    warn!("Bootstrap refresh failed, keeping stored session: {}", error);
                    self.emit(AuthEvent::TransientFailure);
                }
                return;
            }

            let delay = policy.delay_for(attempt);
            debug!(
                "Bootstrap refresh attempt {} failed ({}), retrying in {:?}",
                attempt, error, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn bootstrap_verify(&self) {
        let access_token = self.read().access_token.clone();

        let Some(access_token) = access_token else {
            self.emit(AuthEvent::NothingToRestore);
            return;
        };

        match self.inner.backend.current_user(&access_token).await {
            Ok(user) => {
                self.write().user = Some(user.clone());
                self.inner.storage.save_user(Some(&user));
                self.emit(AuthEvent::Restored);
            }
            Err(e) => {
                warn!("Stored session check failed, clearing tokens: {}", e);
                self.teardown(false);
            }
        }
    }

    /// Apply a successful refresh response. Tokens are persisted before the
    /// profile is fetched, so a failed fetch still leaves them rotated.
    async fn complete_refresh(&self, response: AuthResponse) -> AuthResult<()> {
        let (tokens, user) = response.into_parts();
        let access_token = tokens.access_token.clone();
        self.apply_tokens(tokens);

        let user = match user {
            Some(user) => user,
            None => self.inner.backend.current_user(&access_token).await?,
        };

        self.write().user = Some(user.clone());
        self.inner.storage.save_user(Some(&user));
        Ok(())
    }

    fn apply_tokens(&self, tokens: TokenPair) {
        self.inner.storage.save_tokens(&tokens);
        self.write().rotate(tokens);
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// `stale_access_token` is the token the caller saw fail. If the session
    /// already holds a different one, another caller refreshed first and that
    /// token is returned without contacting the backend.
    pub async fn refresh(&self, stale_access_token: Option<&str>) -> AuthResult<String> {
        let _guard = self.inner.refresh_lock.lock().await;

        let (current, refresh_token, has_user) = {
            let session = self.read();
            (
                session.access_token.clone(),
                session.refresh_token.clone(),
                session.user.is_some(),
            )
        };

        if let Some(current) = current {
            if stale_access_token != Some(current.as_str()) {
                debug!("Access token already rotated by a concurrent refresh");
                return Ok(current);
            }
        }

        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::NotAuthenticated);
        };

        self.emit(AuthEvent::RefreshStarted);

        let result = match self.inner.backend.refresh(&refresh_token).await {
            Ok(response) => {
                let (tokens, user) = response.into_parts();
                let access_token = tokens.access_token.clone();
                self.apply_tokens(tokens);
                self.store_refreshed_user(user, has_user, &access_token).await;
                Ok(access_token)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(access_token) => {
                info!("Access token refreshed");
                self.emit(AuthEvent::Restored);
                Ok(access_token)
            }
            Err(e) if self.inner.policy.teardown.applies_to(&e) => {
                warn!("Token refresh rejected, ending session: {}", e);
                self.teardown(true);
                Err(e)
            }
            Err(e) => {
                warn!("Token refresh failed, keeping session: {}", e);
                self.emit(AuthEvent::TransientFailure);
                Err(e)
            }
        }
    }

    async fn store_refreshed_user(&self, user: Option<User>, had_user: bool, access_token: &str) {
        let user = match user {
            Some(user) => user,
            None if had_user => return,
            None => match self.inner.backend.current_user(access_token).await {
                Ok(user) => user,
                Err(e) => {
                    debug!("Profile fetch after refresh failed: {}", e);
                    return;
                }
            },
        };

        self.write().user = Some(user.clone());
        self.inner.storage.save_user(Some(&user));
    }

    /// Sign in with email and password
    pub async fn login(&self, credentials: &LoginCredentials) -> AuthResult<User> {
        validation::validate_email(&credentials.email).map_err(AuthError::Validation)?;
        if credentials.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let response = self.inner.backend.login(credentials).await?;
        let user = self.establish(response).await?;
        info!("Signed in as user {}", user.id);
        Ok(user)
    }

    /// Create an account and sign in to it
    pub async fn register(&self, registration: &Registration) -> AuthResult<User> {
        validation::validate_name(&registration.name).map_err(AuthError::Validation)?;
        validation::validate_email(&registration.email).map_err(AuthError::Validation)?;
        validation::validate_password(&registration.password).map_err(AuthError::Validation)?;

        let response = self.inner.backend.register(registration).await?;
        let user = self.establish(response).await?;
        info!("Registered and signed in as user {}", user.id);
        Ok(user)
    }

    async fn establish(&self, response: AuthResponse) -> AuthResult<User> {
        let (tokens, user) = response.into_parts();
        let user = match user {
            Some(user) => user,
            None => self.inner.backend.current_user(&tokens.access_token).await?,
        };

        let _guard = self.inner.refresh_lock.lock().await;
        self.inner.storage.save_tokens(&tokens);
        self.inner.storage.save_user(Some(&user));
        {
            let mut session = self.write();
            session.rotate(tokens);
            session.user = Some(user.clone());
        }
        self.emit(AuthEvent::LoggedIn);
        Ok(user)
    }

    /// Sign out. Never fails; calling it without a session is a no-op
    /// apart from clearing storage again.
    pub async fn logout(&self) {
        let _guard = self.inner.refresh_lock.lock().await;

        let refresh_token = self.read().refresh_token.clone();
        if let Some(refresh_token) = refresh_token {
            if let Err(e) = self.inner.backend.logout(&refresh_token).await {
                warn!("Logout request failed, clearing local session anyway: {}", e);
            }
        }

        *self.write() = Session::default();
        self.inner.storage.clear();
        self.emit(AuthEvent::LoggedOut);
        info!("Signed out");
    }

    /// Replace the cached profile after the user edited it
    pub fn update_user(&self, user: User) {
        {
            let mut session = self.write();
            if session.refresh_token.is_none() && session.access_token.is_none() {
                debug!("Ignoring profile update without a session");
                return;
            }
            session.user = Some(user.clone());
        }
        self.inner.storage.save_user(Some(&user));
        self.inner.state.send_modify(|snapshot| snapshot.user = Some(user));
    }

    /// Clear memory and every storage tier. Returns whether there was
    /// anything to clear; the notice is only sent in that case, so one
    /// session produces at most one "expired" notice.
    fn teardown(&self, notify: bool) -> bool {
        let had_session = {
            let mut session = self.write();
            let had_session = !session.is_empty();
            *session = Session::default();
            had_session
        };

        self.inner.storage.clear();
        self.emit(AuthEvent::Rejected);

        if had_session && notify {
            self.inner.notifier.notify(Notice::error(SESSION_EXPIRED));
        }
        had_session
    }

    /// Apply an event to the state machine and publish the result
    fn emit(&self, event: AuthEvent) -> bool {
        let (user, has_refresh_token) = {
            let session = self.read();
            (session.user.clone(), session.refresh_token.is_some())
        };

        let mut from = AuthPhase::Unauthenticated;
        let applied = self.inner.state.send_if_modified(|snapshot| {
            from = snapshot.phase;
            match snapshot.phase.next(event, user.is_some()) {
                Some(phase) => {
                    snapshot.phase = phase;
                    snapshot.user = user;
                    snapshot.has_refresh_token = has_refresh_token;
                    true
                }
                None => false,
            }
        });

        if applied {
            debug!("Session {:?}: {} -> {}", event, from, self.phase());
        } else {
            debug!("Ignoring {:?} in phase {}", event, from);
        }
        applied
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.session.write().unwrap_or_else(|e| e.into_inner())
    }
}
