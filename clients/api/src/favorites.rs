//! Favorite events

use std::sync::Arc;

use auth::{ApiClient, Notice, Notifier};
use reqwest::Method;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::EventSummary;
use crate::optimistic::Optimistic;

/// Client for `/events/{id}/favorite`
#[derive(Clone)]
pub struct FavoritesClient {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

fn set_favorite(events: &mut [EventSummary], event_id: &str, value: bool) {
    if let Some(event) = events.iter_mut().find(|e| e.id == event_id) {
        event.is_favorite = value;
    }
}

impl FavoritesClient {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Flip the favorite flag of `event_id` in `events` and tell the backend.
    ///
    /// Returns the new flag. On failure the flag is restored and an error
    /// notice is sent.
    pub async fn toggle(
        &self,
        events: &Optimistic<Vec<EventSummary>>,
        event_id: &str,
    ) -> ApiResult<bool> {
        let was_favorite = events
            .with(|list| list.iter().find(|e| e.id == event_id).map(|e| e.is_favorite))
            .ok_or_else(|| ApiError::NotFound(format!("event {}", event_id)))?;

        let favorite = !was_favorite;
        let method = if favorite { Method::POST } else { Method::DELETE };
        let path = format!("/events/{}/favorite", event_id);
        debug!("{} {}", method, path);

        let result = events
            .mutate(
                |list| set_favorite(list, event_id, favorite),
                |list| set_favorite(list, event_id, was_favorite),
                self.api.send_empty(method, &path, None::<&()>),
            )
            .await;

        match result {
            Ok(()) => Ok(favorite),
            Err(e) => {
                warn!("Favorite update for event {} failed: {}", event_id, e);
                self.notifier.notify(Notice::error(format!(
                    "Couldn't update favorites: {}",
                    e.user_message()
                )));
                Err(e.into())
            }
        }
    }
}
