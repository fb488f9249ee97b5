//! Session layer for the Encore clients
//!
//! This crate owns the authentication session shared by every screen: token
//! persistence across storage tiers, bootstrap on launch, silent refresh on
//! 401, and the route guards built on top of it.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use auth::{ApiClient, ClientConfig, HttpAuthBackend, SessionManager, TracingNotifier};
//! use auth::storage::WebSessionStorage;
//! use common::{FileStore, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let storage = WebSessionStorage::new(
//!         Arc::new(FileStore::open(&config.store_path)),
//!         Arc::new(MemoryStore::new()),
//!     );
//!     let session = SessionManager::new(
//!         Arc::new(HttpAuthBackend::new(config.clone())?),
//!         Arc::new(storage),
//!         config.platform.refresh_policy(),
//!         Arc::new(TracingNotifier),
//!     );
//!     session.bootstrap().await;
//!
//!     let api = ApiClient::new(config, session)?;
//!     let tickets: serde_json::Value = api.get("/tickets/mine").await?;
//!     println!("{}", tickets);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod notify;
pub mod policy;
pub mod session;
pub mod state;
pub mod storage;
pub mod tokens;
pub mod validation;

#[cfg(test)]
mod testing;

pub use backend::{AuthBackend, AuthRoutes, HttpAuthBackend};
pub use client::ApiClient;
pub use config::{ClientConfig, Platform};
pub use error::{AuthError, AuthResult};
pub use guard::{GuardOutcome, Route, RouteGuard};
pub use models::{LoginCredentials, Registration, Role, User};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use policy::RefreshPolicy;
pub use session::SessionManager;
pub use state::{AuthPhase, SessionSnapshot};
