//! Screen data loading
//!
//! A `ScreenScope` lives from mount to unmount. Loads started in a scope
//! that has since been cancelled resolve to `None`: the request itself still
//! runs to completion, its result is just dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use auth::AuthResult;
use tracing::debug;

use crate::models::{EventSummary, PublicProfile};

/// What a screen renders once a load finished
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Ready(T),
    Empty,
    Error(String),
}

impl<T> LoadState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Loaded data that may have nothing to show
pub trait Content {
    fn is_empty(&self) -> bool;
}

impl<T> Content for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<T> Content for Option<T> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

impl Content for serde_json::Value {
    fn is_empty(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl Content for EventSummary {
    fn is_empty(&self) -> bool {
        false
    }
}

impl Content for PublicProfile {
    fn is_empty(&self) -> bool {
        false
    }
}

fn into_state<T: Content>(result: AuthResult<T>) -> LoadState<T> {
    match result {
        Ok(value) if value.is_empty() => LoadState::Empty,
        Ok(value) => LoadState::Ready(value),
        Err(e) => LoadState::Error(e.user_message()),
    }
}

/// Mount-to-unmount lifetime of a screen
#[derive(Debug, Clone, Default)]
pub struct ScreenScope {
    cancelled: Arc<AtomicBool>,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the screen as unmounted
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Await `fetch` and map its outcome, unless the scope was cancelled
    /// in the meantime
    pub async fn load<T, F>(&self, fetch: F) -> Option<LoadState<T>>
    where
        T: Content,
        F: Future<Output = AuthResult<T>>,
    {
        let result = fetch.await;
        if self.is_cancelled() {
            debug!("Screen unmounted, discarding late response");
            return None;
        }
        Some(into_state(result))
    }

    /// Await two fetches concurrently; each settles independently
    pub async fn load_pair<A, B, FA, FB>(
        &self,
        first: FA,
        second: FB,
    ) -> Option<(LoadState<A>, LoadState<B>)>
    where
        A: Content,
        B: Content,
        FA: Future<Output = AuthResult<A>>,
        FB: Future<Output = AuthResult<B>>,
    {
        let (a, b) = tokio::join!(first, second);
        if self.is_cancelled() {
            debug!("Screen unmounted, discarding late responses");
            return None;
        }
        Some((into_state(a), into_state(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::AuthError;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready_eq};

    #[tokio::test]
    async fn test_load_states() {
        let scope = ScreenScope::new();

        assert_eq!(
            scope.load(async { Ok(vec![1, 2]) }).await,
            Some(LoadState::Ready(vec![1, 2]))
        );
        assert_eq!(
            scope.load(async { Ok(Vec::<u8>::new()) }).await,
            Some(LoadState::Empty)
        );
        assert_eq!(
            scope
                .load(async { Err::<Vec<u8>, _>(AuthError::Transport("reset".into())) })
                .await,
            Some(LoadState::Error(
                "Unable to reach the server. Check your connection.".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_cancelled_scope_discards_late_result() {
        let scope = ScreenScope::new();
        let (tx, rx) = oneshot::channel::<AuthResult<Vec<u8>>>();

        let mut pending = tokio_test::task::spawn(scope.load(async { rx.await.unwrap() }));
        assert_pending!(pending.poll());

        scope.cancel();
        tx.send(Ok(vec![7])).unwrap();

        assert!(pending.is_woken());
        assert_ready_eq!(pending.poll(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_pair_runs_concurrently() {
        let scope = ScreenScope::new();
        let started = tokio::time::Instant::now();

        let slow = async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(Some("profile"))
        };
        let fast = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err::<Vec<u8>, _>(AuthError::Api {
                status: 404,
                message: "No events".to_string(),
            })
        };

        let (profile, events) = scope.load_pair(slow, fast).await.unwrap();

        assert_eq!(profile, LoadState::Ready(Some("profile")));
        assert_eq!(events, LoadState::Error("No events".to_string()));
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
