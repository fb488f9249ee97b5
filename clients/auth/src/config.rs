//! Client configuration loaded from the environment

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AuthError, AuthResult};
use crate::policy::RefreshPolicy;

/// Which client flavour the session layer behaves as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Browser client: tab + durable storage, retrying bootstrap refresh
    Web,
    /// Mobile client: secure storage, fail-fast current-user check
    Mobile,
}

impl Platform {
    /// Default refresh policy for the platform
    pub fn refresh_policy(&self) -> RefreshPolicy {
        match self {
            Platform::Web => RefreshPolicy::web(),
            Platform::Mobile => RefreshPolicy::mobile(),
        }
    }
}

impl FromStr for Platform {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "mobile" => Ok(Platform::Mobile),
            other => Err(AuthError::Configuration(format!(
                "Unknown platform '{}', expected 'web' or 'mobile'",
                other
            ))),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without trailing slash
    pub base_url: String,
    /// Per-request timeout of the HTTP client
    pub request_timeout: Duration,
    /// Client flavour
    pub platform: Platform,
    /// File backing the durable storage tier
    pub store_path: PathBuf,
    /// Upper bound a route guard waits for the session to settle
    pub guard_max_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
            platform: Platform::Web,
            store_path: PathBuf::from(".encore/session.json"),
            guard_max_wait: Duration::from_millis(2000),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_BASE_URL`: Backend base URL (default: "http://localhost:3000")
    /// - `API_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `AUTH_PLATFORM`: `web` or `mobile` (default: "web")
    /// - `SESSION_STORE_PATH`: Durable store file (default: ".encore/session.json")
    /// - `AUTH_GUARD_MAX_WAIT_MS`: Guard wait bound in milliseconds (default: 2000)
    pub fn from_env() -> AuthResult<Self> {
        let defaults = Self::default();

        let base_url = env::var("API_BASE_URL")
            .unwrap_or(defaults.base_url)
            .trim_end_matches('/')
            .to_string();

        let request_timeout = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let platform = match env::var("AUTH_PLATFORM") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.platform,
        };

        let store_path = env::var("SESSION_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let guard_max_wait = env::var("AUTH_GUARD_MAX_WAIT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.guard_max_wait);

        Ok(Self {
            base_url,
            request_timeout,
            platform,
            store_path,
            guard_max_wait,
        })
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
