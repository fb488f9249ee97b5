//! Route guards
//!
//! A guard waits for the session to settle before deciding, so a restore in
//! progress does not bounce the user to the login screen. The wait ends as
//! soon as the session leaves its pending phases; `max_wait` only bounds it.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::models::{Role, User};
use crate::session::SessionManager;
use crate::state::{AuthPhase, SessionSnapshot};

/// Where a guard sends a visitor it turns away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

/// Decision of a guard
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Allow(User),
    Redirect(Route),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allow(_))
    }
}

/// Guard over a session
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionManager,
    max_wait: Duration,
}

/// A stored refresh token before the first bootstrap still counts as pending
fn is_settling(snapshot: &SessionSnapshot) -> bool {
    snapshot.phase.is_pending()
        || (snapshot.phase == AuthPhase::Unauthenticated
            && snapshot.has_refresh_token
            && !snapshot.bootstrapped)
}

impl RouteGuard {
    pub fn new(session: SessionManager, max_wait: Duration) -> Self {
        Self { session, max_wait }
    }

    /// Guard waiting at most `config.guard_max_wait`
    pub fn from_config(session: SessionManager, config: &ClientConfig) -> Self {
        Self::new(session, config.guard_max_wait)
    }

    /// Allow any signed-in user, else redirect to login
    pub async fn require_authenticated(&self) -> GuardOutcome {
        let snapshot = self.settled_snapshot().await;

        match snapshot.user {
            Some(user) if snapshot.phase == AuthPhase::Authenticated => GuardOutcome::Allow(user),
            _ => {
                debug!("Guard redirecting to login (phase {})", snapshot.phase);
                GuardOutcome::Redirect(Route::Login)
            }
        }
    }

    /// Allow signed-in users whose role is in `allowed`, else redirect home
    pub async fn require_role(&self, allowed: &[Role]) -> GuardOutcome {
        match self.require_authenticated().await {
            GuardOutcome::Allow(user) if user.role.is_in(allowed) => GuardOutcome::Allow(user),
            GuardOutcome::Allow(user) => {
                debug!("Role {} not allowed here, redirecting home", user.role.as_str());
                GuardOutcome::Redirect(Route::Home)
            }
            redirect => redirect,
        }
    }

    async fn settled_snapshot(&self) -> SessionSnapshot {
        let mut updates = self.session.subscribe();
        let settled = tokio::time::timeout(self.max_wait, updates.wait_for(|s| !is_settling(s)))
            .await
            .map(|result| result.map(|snapshot| snapshot.clone()));

        match settled {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(_)) => self.session.snapshot(),
            Err(_) => {
                info!("Session still settling after {:?}", self.max_wait);
                self.session.snapshot()
            }
        }
    }
}
