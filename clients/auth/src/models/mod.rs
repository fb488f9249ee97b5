//! Session layer models

pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use role::Role;
pub use session::{AuthResponse, RefreshRequest, Session, StoredSession, TokenPair};
pub use user::{LoginCredentials, Registration, User};
