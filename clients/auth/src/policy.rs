//! Refresh policies
//!
//! The web and mobile clients historically disagreed on how hard to try
//! before giving up on a stored session. Both behaviours are kept here as
//! named presets so the choice is explicit.

use std::time::Duration;

use crate::error::AuthError;

/// How a stored session is restored on launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStrategy {
    /// Exchange the refresh token for a new pair, retrying transient failures
    RefreshWithRetry,
    /// Fetch the current user with the stored access token, once
    VerifyCurrentUser,
}

/// Which refresh failures end the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownRule {
    /// Only an explicit 401/403 from the backend
    OnAuthRejection,
    /// Any failure at all
    OnAnyFailure,
}

impl TeardownRule {
    /// Whether `error` should clear the session under this rule
    pub fn applies_to(&self, error: &AuthError) -> bool {
        match self {
            TeardownRule::OnAuthRejection => error.is_auth_rejection(),
            TeardownRule::OnAnyFailure => true,
        }
    }
}

/// Refresh and bootstrap policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub bootstrap: BootstrapStrategy,
    /// Retries after the first bootstrap refresh attempt
    pub max_retries: u32,
    /// Linear backoff unit: attempt `n` waits `n * backoff_step`
    pub backoff_step: Duration,
    pub teardown: TeardownRule,
}

impl RefreshPolicy {
    /// Browser policy: 2 retries with 250ms linear backoff, only 401/403 log out
    pub fn web() -> Self {
        Self {
            bootstrap: BootstrapStrategy::RefreshWithRetry,
            max_retries: 2,
            backoff_step: Duration::from_millis(250),
            teardown: TeardownRule::OnAuthRejection,
        }
    }

    /// Mobile policy: single current-user check, any failure logs out
    pub fn mobile() -> Self {
        Self {
            bootstrap: BootstrapStrategy::VerifyCurrentUser,
            max_retries: 0,
            backoff_step: Duration::ZERO,
            teardown: TeardownRule::OnAnyFailure,
        }
    }

    /// Total bootstrap refresh attempts
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::web()
    }
}
