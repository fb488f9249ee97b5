//! Role model and related functionality

use serde::{Deserialize, Serialize};

/// Platform role attached to a user profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular attendee
    #[default]
    User,
    /// Verified event organizer
    Organizer,
    /// Content moderator
    Moderator,
    /// Platform administrator
    Admin,
    /// Any role this client does not know about
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Get the role name as sent by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }

    /// Check membership in an allowed set. `Unknown` is never allowed.
    pub fn is_in(&self, allowed: &[Role]) -> bool {
        *self != Role::Unknown && allowed.contains(self)
    }
}
