//! Session model and related functionality

use serde::{Deserialize, Serialize};

use super::User;

/// Access/refresh credential pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body returned by login, register and refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthResponse {
    /// Split into the rotated tokens and the optional user
    pub fn into_parts(self) -> (TokenPair, Option<User>) {
        (
            TokenPair {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
            },
            self.user,
        )
    }
}

/// Body sent to the refresh and logout endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// In-memory session owned by the session manager
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    /// Apply a rotated token pair
    pub fn rotate(&mut self, tokens: TokenPair) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = Some(tokens.refresh_token);
    }

    /// True when nothing is held
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// Whatever a storage tier managed to read back
pub type StoredSession = Session;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_wire_format() {
        let body = r#"{
            "accessToken": "a1",
            "refreshToken": "r1",
            "user": {"id": "u1", "name": "Ada", "email": "ada@example.com", "role": "organizer"}
        }"#;

        let response: AuthResponse = serde_json::from_str(body).unwrap();
        let (tokens, user) = response.into_parts();
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token, "r1");
        let user = user.unwrap();
        assert_eq!(user.role, super::super::Role::Organizer);
        assert_eq!(user.avatar, None);
    }

    #[test]
    fn test_auth_response_without_user() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"accessToken":"a1","refreshToken":"r1"}"#).unwrap();
        assert!(response.user.is_none());

        let request = serde_json::to_value(RefreshRequest {
            refresh_token: "r1".to_string(),
        })
        .unwrap();
        assert_eq!(request, serde_json::json!({"refreshToken": "r1"}));
    }
}
