//! Common library for the Encore clients
//!
//! This crate provides shared functionality used across the client crates,
//! mainly the key/value storage tiers the session is persisted in and
//! their error types.

pub mod error;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
