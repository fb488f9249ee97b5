//! Following other users

use std::sync::Arc;

use auth::{ApiClient, Notice, Notifier};
use reqwest::Method;
use tracing::warn;

use crate::error::ApiResult;
use crate::models::PublicProfile;
use crate::optimistic::Optimistic;

/// Client for `/users/{id}/follow`
#[derive(Clone)]
pub struct FollowsClient {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

fn set_following(profile: &mut PublicProfile, following: bool) {
    if profile.is_following == following {
        return;
    }
    profile.is_following = following;
    profile.followers_count = if following {
        profile.followers_count + 1
    } else {
        profile.followers_count.saturating_sub(1)
    };
}

impl FollowsClient {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Follow or unfollow the user behind `profile`, keeping the follower
    /// count in step. Returns whether the user is now followed.
    pub async fn toggle(&self, profile: &Optimistic<PublicProfile>) -> ApiResult<bool> {
        let (user_id, was_following) = profile.with(|p| (p.id.clone(), p.is_following));

        let following = !was_following;
        let method = if following { Method::POST } else { Method::DELETE };
        let path = format!("/users/{}/follow", user_id);

        let result = profile
            .mutate(
                |p| set_following(p, following),
                |p| set_following(p, was_following),
                self.api.send_empty(method, &path, None::<&()>),
            )
            .await;

        match result {
            Ok(()) => Ok(following),
            Err(e) => {
                warn!("Follow update for user {} failed: {}", user_id, e);
                let action = if following { "follow" } else { "unfollow" };
                self.notifier.notify(Notice::error(format!(
                    "Couldn't {} this user: {}",
                    action,
                    e.user_message()
                )));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(following: bool, followers: u64) -> PublicProfile {
        PublicProfile {
            id: "u2".to_string(),
            name: "Grace".to_string(),
            avatar: None,
            is_following: following,
            followers_count: followers,
        }
    }

    #[test]
    fn test_set_following_adjusts_count() {
        let mut p = profile(false, 3);
        set_following(&mut p, true);
        assert_eq!(p, profile(true, 4));

        set_following(&mut p, false);
        assert_eq!(p, profile(false, 3));
    }

    #[test]
    fn test_set_following_is_idempotent() {
        let mut p = profile(true, 0);
        set_following(&mut p, true);
        assert_eq!(p, profile(true, 0));

        // Count never goes below zero
        set_following(&mut p, false);
        assert_eq!(p, profile(false, 0));
    }
}
