//! Optimistic local state
//!
//! `Optimistic<T>` holds the state a screen renders from. A mutation is
//! applied before the request is sent and reverted if the request fails;
//! subscribers see both changes.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Shared cell of screen state
#[derive(Debug)]
pub struct Optimistic<T> {
    state: Arc<watch::Sender<T>>,
}

impl<T> Clone for Optimistic<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Optimistic<T> {
    pub fn new(value: T) -> Self {
        let (state, _) = watch::channel(value);
        Self {
            state: Arc::new(state),
        }
    }

    /// Current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.state.borrow().clone()
    }

    /// Read the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Replace the value, e.g. with a fresh server response
    pub fn set(&self, value: T) {
        self.state.send_replace(value);
    }

    /// Receive every change to the value
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Apply `apply` now, await `request`, and run `revert` if it fails.
    ///
    /// `revert` should undo only what `apply` did, so that other mutations
    /// landing in between survive the rollback.
    pub async fn mutate<R, E, Fut>(
        &self,
        apply: impl FnOnce(&mut T),
        revert: impl FnOnce(&mut T),
        request: Fut,
    ) -> Result<R, E>
    where
        Fut: Future<Output = Result<R, E>>,
    {
        self.state.send_modify(apply);

        match request.await {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!("Request failed, rolling back optimistic update");
                self.state.send_modify(revert);
                Err(e)
            }
        }
    }
}
