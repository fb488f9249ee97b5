//! Custom error types for the session layer

use thiserror::Error;

/// Custom error type for authentication and API calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// The backend answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (connect failure, timeout)
    #[error("Network error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),

    /// An operation needed a session and none exists
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Local input validation rejected the request before it was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// HTTP status of the failure, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 and 403 are the only answers that end a session
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Failures worth retrying: transport errors and 5xx/408/429 answers
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Transport(_) => true,
            AuthError::Api { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }

    /// Message suitable for a toast or inline banner
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api { message, .. } if !message.is_empty() => message.clone(),
            AuthError::Api { status, .. } => format!("Request failed ({})", status),
            AuthError::Transport(_) => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            AuthError::Decode(_) => "Unexpected response from the server.".to_string(),
            AuthError::NotAuthenticated => "Please log in to continue.".to_string(),
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Configuration(_) => "The app is misconfigured.".to_string(),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AuthError::Decode(e.to_string())
        } else {
            AuthError::Transport(e.to_string())
        }
    }
}

/// Type alias for session layer results
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> AuthError {
        AuthError::Api {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_auth_rejection_statuses() {
        assert!(api(401).is_auth_rejection());
        assert!(api(403).is_auth_rejection());
        assert!(!api(500).is_auth_rejection());
        assert!(!AuthError::Transport("timeout".into()).is_auth_rejection());
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(503).is_transient());
        assert!(api(429).is_transient());
        assert!(AuthError::Transport("reset".into()).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(401).is_transient());
    }

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = AuthError::Api {
            status: 422,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.user_message(), "Email already registered");
        assert_eq!(api(500).user_message(), "Request failed (500)");
    }
}
