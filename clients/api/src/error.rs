//! Errors of the feature clients

use auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Request or session failure from the auth layer
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The screen that asked for the result is gone
    #[error("Request cancelled")]
    Cancelled,

    /// The item to mutate is not in the local state
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Message suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.user_message(),
            ApiError::Cancelled => "Request cancelled".to_string(),
            ApiError::NotFound(_) => "This item is no longer available".to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
