//! Scripted auth backend shared by the unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::AuthBackend;
use crate::error::{AuthError, AuthResult};
use crate::models::{AuthResponse, LoginCredentials, Registration, Role, User};

pub fn user() -> User {
    User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::User,
        avatar: None,
        bio: None,
    }
}

pub fn response(n: u32, with_user: bool) -> AuthResponse {
    AuthResponse {
        access_token: format!("access-{}", n),
        refresh_token: format!("refresh-{}", n),
        user: with_user.then(user),
    }
}

pub fn api_error(status: u16) -> AuthError {
    AuthError::Api {
        status,
        message: String::new(),
    }
}

/// Backend answering from queues; an empty queue answers like a dead server
#[derive(Default)]
pub struct ScriptedBackend {
    pub refresh_results: Mutex<VecDeque<AuthResult<AuthResponse>>>,
    pub user_results: Mutex<VecDeque<AuthResult<User>>>,
    pub login_results: Mutex<VecDeque<AuthResult<AuthResponse>>>,
    pub refresh_delay: Duration,
    pub refresh_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn with_refreshes(results: Vec<AuthResult<AuthResponse>>) -> Self {
        Self {
            refresh_results: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    pub fn push_user(&self, result: AuthResult<User>) {
        self.user_results.lock().unwrap().push_back(result);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn login(&self, _credentials: &LoginCredentials) -> AuthResult<AuthResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(api_error(401)))
    }

    async fn register(&self, _registration: &Registration) -> AuthResult<AuthResponse> {
        Ok(response(1, true))
    }

    async fn refresh(&self, _refresh_token: &str) -> AuthResult<AuthResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::Transport("no scripted response".into())))
    }

    async fn logout(&self, _refresh_token: &str) -> AuthResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_user(&self, _access_token: &str) -> AuthResult<User> {
        self.user_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(api_error(401)))
    }
}
