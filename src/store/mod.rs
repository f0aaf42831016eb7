//! The shared real-time store the game session lives in.
//!
//! The store is an opaque key-path addressed tree: clients subscribe to a
//! path and get the current value plus every subsequent change pushed to
//! them, overwrite a path unconditionally, or run an atomic read-modify-write
//! transaction on a single path. Cup and stat writes are deliberately plain
//! overwrites (last write wins); only the roster uses the transaction
//! primitive.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Store connection closed")]
    Closed,

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Update function for a single-path transaction. Receives the current value
/// (`Null` when absent) and returns the value to write back. May be invoked
/// more than once if the backend retries on contention.
pub type TransactUpdate<'a> = &'a mut (dyn FnMut(Value) -> Value + Send);

/// Trait all store backends implement
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Subscribe to a path. The receiver starts at the current value
    /// (`Null` when absent) and is updated on every write affecting the
    /// path, in write order. Intermediate values may be coalesced.
    async fn subscribe(&self, path: &str) -> StoreResult<watch::Receiver<Value>>;

    /// Unconditional overwrite of the value at a path.
    /// Writing `Null` deletes the node.
    async fn set(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Atomic read-modify-write of a single path.
    async fn transact(&self, path: &str, update: TransactUpdate<'_>) -> StoreResult<Value>;
}

/// Split a slash-separated key path into segments
pub(crate) fn split_path(path: &str) -> StoreResult<Vec<String>> {
    let segments: Vec<String> = path
        .split('/')
        .map(|s| s.to_string())
        .collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}
