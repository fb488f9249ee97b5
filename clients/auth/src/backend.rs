//! Authentication backend
//!
//! `AuthBackend` is the seam between the session manager and the remote
//! auth endpoints. `HttpAuthBackend` talks to the real REST API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};
use crate::models::{AuthResponse, LoginCredentials, RefreshRequest, Registration, User};

/// Remote authentication operations
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session
    async fn login(&self, credentials: &LoginCredentials) -> AuthResult<AuthResponse>;

    /// Create an account and open a session for it
    async fn register(&self, registration: &Registration) -> AuthResult<AuthResponse>;

    /// Exchange a refresh token for a rotated pair
    async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthResponse>;

    /// Revoke a refresh token
    async fn logout(&self, refresh_token: &str) -> AuthResult<()>;

    /// Fetch the profile the access token belongs to
    async fn current_user(&self, access_token: &str) -> AuthResult<User>;
}

/// Paths of the auth endpoints
#[derive(Debug, Clone)]
pub struct AuthRoutes {
    pub login: String,
    pub register: String,
    pub refresh: String,
    pub logout: String,
    pub me: String,
}

impl Default for AuthRoutes {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            refresh: "/auth/refresh".to_string(),
            logout: "/auth/logout".to_string(),
            me: "/auth/me".to_string(),
        }
    }
}

impl AuthRoutes {
    /// Requests to these paths never trigger a refresh-and-replay
    pub fn is_auth_route(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        [&self.login, &self.register, &self.refresh, &self.logout]
            .iter()
            .any(|route| path == route.as_str())
    }
}

/// Build the HTTP client every request goes through
pub fn build_http_client(config: &ClientConfig) -> AuthResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into an `AuthError::Api`, pulling the most
/// useful message out of the body
pub async fn error_from_response(response: Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AuthError::Api {
        status: status.as_u16(),
        message: extract_message(status, &body),
    }
}

fn extract_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

/// Decode a JSON response, mapping failures to `AuthError`
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Decode(e.to_string()))
}

/// Auth backend over HTTP
#[derive(Clone)]
pub struct HttpAuthBackend {
    client: Client,
    config: ClientConfig,
    routes: AuthRoutes,
}

impl HttpAuthBackend {
    /// Create a backend with the default routes
    pub fn new(config: ClientConfig) -> AuthResult<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
            routes: AuthRoutes::default(),
        })
    }

    /// Override the endpoint paths
    pub fn with_routes(mut self, routes: AuthRoutes) -> Self {
        self.routes = routes;
        self
    }

    /// Endpoint paths in use
    pub fn routes(&self) -> &AuthRoutes {
        &self.routes
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AuthResult<T> {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.config.url(path))
            .json(body)
            .send()
            .await?;
        decode_json(response).await
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> AuthResult<AuthResponse> {
        info!("Login request for {}", credentials.email);
        self.post(&self.routes.login, credentials).await
    }

    async fn register(&self, registration: &Registration) -> AuthResult<AuthResponse> {
        info!("Register request for {}", registration.email);
        self.post(&self.routes.register, registration).await
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthResponse> {
        info!("Token refresh request");
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post(&self.routes.refresh, &body).await
    }

    async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        info!("Logout request");
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response = self
            .client
            .post(self.config.url(&self.routes.logout))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> AuthResult<User> {
        debug!("GET {}", self.routes.me);
        let response = self
            .client
            .get(self.config.url(&self.routes.me))
            .bearer_auth(access_token)
            .send()
            .await?;
        decode_json(response).await
    }
}
