use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event card as listed on discovery and favorites screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Another user's profile as seen by the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub followers_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_summary_defaults() {
        let event: EventSummary =
            serde_json::from_str(r#"{"id":"e1","title":"Night Market"}"#).unwrap();

        assert!(!event.is_favorite);
        assert_eq!(event.starts_at, None);
    }

    #[test]
    fn test_profile_wire_format() {
        let profile: PublicProfile = serde_json::from_str(
            r#"{"id":"u2","name":"Grace","isFollowing":true,"followersCount":12}"#,
        )
        .unwrap();

        assert!(profile.is_following);
        assert_eq!(profile.followers_count, 12);
    }
}
