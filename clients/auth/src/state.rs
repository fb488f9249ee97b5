//! Session state machine
//!
//! Every change to the session goes through `AuthPhase::next`, so the set
//! of reachable states is the transition table below and nothing else.

use std::fmt;

use crate::models::User;

/// Phase of the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    Bootstrapping,
    Authenticated,
    Refreshing,
    /// Restoring failed for a transient reason; the stored session is kept
    Error,
}

impl AuthPhase {
    /// True while the outcome is still being decided
    pub fn is_pending(&self) -> bool {
        matches!(self, AuthPhase::Bootstrapping | AuthPhase::Refreshing)
    }

    /// Phase after `event`, or `None` if the transition is not allowed.
    ///
    /// `has_user` tells a failed silent refresh whether there is still a
    /// usable session to fall back to.
    pub fn next(self, event: AuthEvent, has_user: bool) -> Option<AuthPhase> {
        use AuthEvent::*;
        use AuthPhase::*;

        match (self, event) {
            (_, LoggedIn) => Some(Authenticated),
            (_, LoggedOut) => Some(Unauthenticated),

            (Unauthenticated | Error, BootstrapStarted) => Some(Bootstrapping),
            (Bootstrapping, NothingToRestore) => Some(Unauthenticated),
            (Bootstrapping, TransientFailure) => Some(Error),
            (Bootstrapping | Refreshing, Restored) => Some(Authenticated),

            // Only emitted when a refresh token is held
            (Unauthenticated | Authenticated | Error, RefreshStarted) => Some(Refreshing),
            (Refreshing, TransientFailure) if has_user => Some(Authenticated),
            (Refreshing, TransientFailure) => Some(Error),

            (Bootstrapping | Refreshing | Authenticated | Error, Rejected) => {
                Some(Unauthenticated)
            }

            _ => None,
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthPhase::Unauthenticated => "unauthenticated",
            AuthPhase::Bootstrapping => "bootstrapping",
            AuthPhase::Authenticated => "authenticated",
            AuthPhase::Refreshing => "refreshing",
            AuthPhase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Something that happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    BootstrapStarted,
    NothingToRestore,
    RefreshStarted,
    /// A refresh or current-user check succeeded
    Restored,
    /// A refresh failed but the session was kept
    TransientFailure,
    /// The backend rejected the session, or the policy gave up on it
    Rejected,
    LoggedIn,
    LoggedOut,
}

/// What observers see of the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub has_refresh_token: bool,
    /// Set once the first bootstrap has finished, whatever its outcome
    pub bootstrapped: bool,
}

impl SessionSnapshot {
    /// Authenticated with a known user
    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated && self.user.is_some()
    }
}
