//! Session persistence across storage tiers
//!
//! Persistence is best-effort: a tier that refuses a write (quota, storage
//! disabled) is logged and skipped, and the session lives on in memory for
//! the rest of the process.

use std::sync::Arc;

use common::{KeyValueStore, StorageResult};
use tracing::warn;

use crate::models::{StoredSession, TokenPair, User};

/// Key of the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Key of the cached user profile
pub const USER_KEY: &str = "user";

/// Where a session manager persists its session
pub trait SessionStorage: Send + Sync {
    /// Read back whatever was persisted
    fn load(&self) -> StoredSession;

    /// Persist a rotated token pair
    fn save_tokens(&self, tokens: &TokenPair);

    /// Persist or forget the cached user
    fn save_user(&self, user: Option<&User>);

    /// Remove every session key from every tier
    fn clear(&self);
}

fn read(store: &dyn KeyValueStore, tier: &str, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {} from {} storage: {}", key, tier, e);
            None
        }
    }
}

fn ignore_failure(result: StorageResult<()>, tier: &str, key: &str) {
    if let Err(e) = result {
        warn!("Failed to write {} to {} storage: {}", key, tier, e);
    }
}

/// Browser layout: tab-scoped store for the access token, durable store for
/// the refresh token and user, with the refresh token mirrored in the tab
pub struct WebSessionStorage {
    durable: Arc<dyn KeyValueStore>,
    tab: Arc<dyn KeyValueStore>,
}

impl WebSessionStorage {
    pub fn new(durable: Arc<dyn KeyValueStore>, tab: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, tab }
    }
}

impl SessionStorage for WebSessionStorage {
    fn load(&self) -> StoredSession {
        let access_token = read(self.tab.as_ref(), "tab", ACCESS_TOKEN_KEY);
        let refresh_token = read(self.tab.as_ref(), "tab", REFRESH_TOKEN_KEY)
            .or_else(|| read(self.durable.as_ref(), "durable", REFRESH_TOKEN_KEY));

        let user = read(self.durable.as_ref(), "durable", USER_KEY).and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .map_err(|e| warn!("Discarding unreadable cached user: {}", e))
                .ok()
        });

        StoredSession {
            access_token,
            refresh_token,
            user,
        }
    }

    fn save_tokens(&self, tokens: &TokenPair) {
        ignore_failure(
            self.tab.set(ACCESS_TOKEN_KEY, &tokens.access_token),
            "tab",
            ACCESS_TOKEN_KEY,
        );
        ignore_failure(
            self.durable.set(REFRESH_TOKEN_KEY, &tokens.refresh_token),
            "durable",
            REFRESH_TOKEN_KEY,
        );
        ignore_failure(
            self.tab.set(REFRESH_TOKEN_KEY, &tokens.refresh_token),
            "tab",
            REFRESH_TOKEN_KEY,
        );
    }

    fn save_user(&self, user: Option<&User>) {
        let result = match user {
            Some(user) => serde_json::to_string(user)
                .map_err(Into::into)
                .and_then(|raw| self.durable.set(USER_KEY, &raw)),
            None => self.durable.delete(USER_KEY),
        };
        ignore_failure(result, "durable", USER_KEY);
    }

    fn clear(&self) {
        ignore_failure(self.tab.delete(ACCESS_TOKEN_KEY), "tab", ACCESS_TOKEN_KEY);
        ignore_failure(self.tab.delete(REFRESH_TOKEN_KEY), "tab", REFRESH_TOKEN_KEY);
        ignore_failure(
            self.durable.delete(REFRESH_TOKEN_KEY),
            "durable",
            REFRESH_TOKEN_KEY,
        );
        ignore_failure(self.durable.delete(USER_KEY), "durable", USER_KEY);
    }
}

/// Mobile layout: both tokens in platform secure storage. When secure
/// storage is unavailable (web-embedded context) the fallback store is used.
/// The user is never persisted; it is fetched on launch.
pub struct SecureSessionStorage {
    secure: Arc<dyn KeyValueStore>,
    fallback: Option<Arc<dyn KeyValueStore>>,
}

impl SecureSessionStorage {
    pub fn new(secure: Arc<dyn KeyValueStore>) -> Self {
        Self {
            secure,
            fallback: None,
        }
    }

    pub fn with_fallback(secure: Arc<dyn KeyValueStore>, fallback: Arc<dyn KeyValueStore>) -> Self {
        Self {
            secure,
            fallback: Some(fallback),
        }
    }

    fn store(&self) -> (&dyn KeyValueStore, &'static str) {
        match &self.fallback {
            Some(fallback) if !self.secure.is_available() => (fallback.as_ref(), "fallback"),
            _ => (self.secure.as_ref(), "secure"),
        }
    }
}

impl SessionStorage for SecureSessionStorage {
    fn load(&self) -> StoredSession {
        let (store, tier) = self.store();
        StoredSession {
            access_token: read(store, tier, ACCESS_TOKEN_KEY),
            refresh_token: read(store, tier, REFRESH_TOKEN_KEY),
            user: None,
        }
    }

    fn save_tokens(&self, tokens: &TokenPair) {
        let (store, tier) = self.store();
        ignore_failure(
            store.set(ACCESS_TOKEN_KEY, &tokens.access_token),
            tier,
            ACCESS_TOKEN_KEY,
        );
        ignore_failure(
            store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token),
            tier,
            REFRESH_TOKEN_KEY,
        );
    }

    fn save_user(&self, _user: Option<&User>) {}

    fn clear(&self) {
        let (store, tier) = self.store();
        ignore_failure(store.delete(ACCESS_TOKEN_KEY), tier, ACCESS_TOKEN_KEY);
        ignore_failure(store.delete(REFRESH_TOKEN_KEY), tier, REFRESH_TOKEN_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use common::MemoryStore;

    fn tokens(n: u32) -> TokenPair {
        TokenPair {
            access_token: format!("access-{}", n),
            refresh_token: format!("refresh-{}", n),
        }
    }

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Organizer,
            avatar: None,
            bio: Some("Runs the jazz nights".to_string()),
        }
    }

    #[test]
    fn test_web_layout() {
        let durable = Arc::new(MemoryStore::new());
        let tab = Arc::new(MemoryStore::new());
        let storage = WebSessionStorage::new(durable.clone(), tab.clone());

        storage.save_tokens(&tokens(1));
        storage.save_user(Some(&user()));

        assert_eq!(durable.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(tab.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("access-1"));
        assert_eq!(durable.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(tab.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-1"));

        let loaded = storage.load();
        assert_eq!(loaded.access_token.as_deref(), Some("access-1"));
        assert_eq!(loaded.user, Some(user()));
    }

    #[test]
    fn test_web_new_tab_uses_durable_refresh_token() {
        let durable = Arc::new(MemoryStore::new());
        WebSessionStorage::new(durable.clone(), Arc::new(MemoryStore::new()))
            .save_tokens(&tokens(1));

        // A fresh tab has an empty tab store
        let loaded = WebSessionStorage::new(durable, Arc::new(MemoryStore::new())).load();
        assert_eq!(loaded.access_token, None);
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_web_write_failures_are_ignored() {
        let durable = Arc::new(MemoryStore::new());
        durable.set_disabled(true);
        let tab = Arc::new(MemoryStore::new());
        let storage = WebSessionStorage::new(durable, tab.clone());

        storage.save_tokens(&tokens(2));
        storage.save_user(Some(&user()));
        storage.clear();

        assert!(tab.is_empty());
    }

    #[test]
    fn test_web_corrupt_user_is_discarded() {
        let durable = Arc::new(MemoryStore::new());
        durable.set(USER_KEY, "{not json").unwrap();
        durable.set(REFRESH_TOKEN_KEY, "refresh-1").unwrap();

        let loaded = WebSessionStorage::new(durable, Arc::new(MemoryStore::new())).load();
        assert_eq!(loaded.user, None);
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_web_clear_empties_both_tiers() {
        let durable = Arc::new(MemoryStore::new());
        let tab = Arc::new(MemoryStore::new());
        let storage = WebSessionStorage::new(durable.clone(), tab.clone());

        storage.save_tokens(&tokens(1));
        storage.save_user(Some(&user()));
        storage.clear();

        assert!(durable.is_empty());
        assert!(tab.is_empty());
        assert!(storage.load().is_empty());
    }

    #[test]
    fn test_secure_storage_falls_back() {
        let secure = Arc::new(MemoryStore::new());
        secure.set_disabled(true);
        let fallback = Arc::new(MemoryStore::new());
        let storage = SecureSessionStorage::with_fallback(secure, fallback.clone());

        storage.save_tokens(&tokens(3));
        storage.save_user(Some(&user()));

        assert_eq!(fallback.len(), 2);
        let loaded = storage.load();
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-3"));
        assert_eq!(loaded.user, None);

        storage.clear();
        assert!(fallback.is_empty());
    }

    #[test]
    fn test_secure_storage_prefers_secure_tier() {
        let secure = Arc::new(MemoryStore::new());
        let fallback = Arc::new(MemoryStore::new());
        let storage = SecureSessionStorage::with_fallback(secure.clone(), fallback.clone());

        storage.save_tokens(&tokens(4));
        assert_eq!(secure.len(), 2);
        assert!(fallback.is_empty());
    }

    #[test]
    fn test_web_session_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let storage = WebSessionStorage::new(
            Arc::new(common::FileStore::open(&path)),
            Arc::new(MemoryStore::new()),
        );
        storage.save_tokens(&tokens(2));
        storage.save_user(Some(&user()));

        // New tab: the tab tier starts empty, the file is reopened
        let reloaded = WebSessionStorage::new(
            Arc::new(common::FileStore::open(&path)),
            Arc::new(MemoryStore::new()),
        )
        .load();

        assert_eq!(reloaded.access_token, None);
        assert_eq!(reloaded.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(reloaded.user, Some(user()));
    }
}
