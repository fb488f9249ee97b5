//! Authenticated API client
//!
//! Every request goes out with the session's current bearer token. A 401
//! on a non-auth route triggers one refresh through the session manager and
//! one replay of the original request; the `retried` flag is local to the
//! request, so a replay that fails again is returned as is.

use chrono::Utc;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::backend::{AuthRoutes, build_http_client, decode_json, error_from_response};
use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};
use crate::session::SessionManager;
use crate::tokens;

/// HTTP client bound to a session
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    session: SessionManager,
    routes: AuthRoutes,
    expiry_leeway: chrono::Duration,
}

impl ApiClient {
    /// Create a client for `config.base_url` reading tokens from `session`
    pub fn new(config: ClientConfig, session: SessionManager) -> AuthResult<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
            session,
            routes: AuthRoutes::default(),
            expiry_leeway: chrono::Duration::seconds(10),
        })
    }

    /// Override the auth endpoint paths excluded from refresh-and-replay
    pub fn with_routes(mut self, routes: AuthRoutes) -> Self {
        self.routes = routes;
        self
    }

    /// The session this client authenticates with
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        self.send_json(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> AuthResult<()> {
        self.send_empty(Method::DELETE, path, None::<&()>).await
    }

    /// Send a request and decode the JSON response
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(method, path, body).await?;
        decode_json(response).await
    }

    /// Send a request whose response body is ignored
    pub async fn send_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> AuthResult<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.execute(method, path, body).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> AuthResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AuthError::Decode(format!("Failed to encode request body: {}", e)))?;

        let refreshable = !self.routes.is_auth_route(path);
        let mut token = self.session.access_token();

        let expired = refreshable
            && token
                .as_deref()
                .is_some_and(|t| tokens::is_expired(t, Utc::now(), self.expiry_leeway));
        if expired {
            debug!("Access token expired before {} {}, refreshing", method, path);
            if let Err(e) = self.session.refresh(token.as_deref()).await {
                debug!("Proactive refresh failed: {}", e);
            }
            token = self.session.access_token();
        }

        let mut retried = false;
        loop {
            let response = self
                .dispatch(method.clone(), path, body.as_ref(), token.as_deref())
                .await?;

            if response.status() != StatusCode::UNAUTHORIZED || retried || !refreshable {
                return Ok(response);
            }

            retried = true;
            info!("{} {} returned 401, refreshing session", method, path);

            let refreshed = self.session.refresh(token.as_deref()).await;
            match refreshed {
                Ok(new_token) => token = Some(new_token),
                Err(e) => {
                    warn!("Session refresh after 401 failed: {}", e);
                    return Ok(response);
                }
            }
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> AuthResult<Response> {
        let mut request = self.client.request(method, self.config.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}
