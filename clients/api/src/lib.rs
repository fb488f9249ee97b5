//! Feature clients for the Encore screens
//!
//! Everything here sits on top of `auth::ApiClient`, so requests carry the
//! session's bearer token and recover from an expired access token on their
//! own. The helpers cover what every screen repeats: optimistic mutations
//! with rollback, and loads that are discarded once the screen is gone.

pub mod error;
pub mod favorites;
pub mod follows;
pub mod loader;
pub mod models;
pub mod optimistic;

pub use error::{ApiError, ApiResult};
pub use favorites::FavoritesClient;
pub use follows::FollowsClient;
pub use loader::{Content, LoadState, ScreenScope};
pub use models::{EventSummary, PublicProfile};
pub use optimistic::Optimistic;
