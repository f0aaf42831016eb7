//! In-process store backend with real-time-database tree semantics.
//!
//! Holds one JSON tree; slash-separated path segments index nested objects.
//! A write at any path notifies every subscription whose path is an ancestor
//! or descendant of the written path, so subscribing to `games/x/stats`
//! observes writes to `games/x/stats/{name}`. Used for single-process party
//! play and for tests.

use super::{split_path, SharedStore, StoreResult, TransactUpdate};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{watch, RwLock};

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    root: Value,
    subscriptions: Vec<Subscription>,
}

struct Subscription {
    segments: Vec<String>,
    tx: watch::Sender<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                root: Value::Object(Map::new()),
                subscriptions: Vec::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the value at a path, `Null` when absent
fn value_at(root: &Value, segments: &[String]) -> Value {
    let mut current = root;
    for segment in segments {
        match current.get(segment.as_str()) {
            Some(child) => current = child,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Coerce a node into an object, replacing whatever else was there
fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Write a value at a path, creating intermediate objects as needed.
/// `Null` deletes the node.
fn set_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        current = ensure_object(current)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = ensure_object(current);
    if value.is_null() {
        map.remove(last);
    } else {
        map.insert(last.clone(), value);
    }
}

/// Whether a write at `written` is visible to a subscription at `watched`
/// (one path is a prefix of the other)
fn affects(written: &[String], watched: &[String]) -> bool {
    let shorter = written.len().min(watched.len());
    written[..shorter] == watched[..shorter]
}

impl Inner {
    fn notify(&mut self, written: &[String]) {
        let root = &self.root;
        self.subscriptions.retain(|sub| {
            if affects(written, &sub.segments) {
                let snapshot = value_at(root, &sub.segments);
                // A send error means every receiver is gone; drop the subscription
                sub.tx.send(snapshot).is_ok()
            } else {
                !sub.tx.is_closed()
            }
        });
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn subscribe(&self, path: &str) -> StoreResult<watch::Receiver<Value>> {
        let segments = split_path(path)?;
        let mut inner = self.inner.write().await;
        let current = value_at(&inner.root, &segments);
        let (tx, rx) = watch::channel(current);
        inner.subscriptions.push(Subscription { segments, tx });
        Ok(rx)
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let segments = split_path(path)?;
        let mut inner = self.inner.write().await;
        set_at(&mut inner.root, &segments, value);
        inner.notify(&segments);
        Ok(())
    }

    async fn transact(&self, path: &str, update: TransactUpdate<'_>) -> StoreResult<Value> {
        let segments = split_path(path)?;
        // The write lock is held across read-modify-write, which is exactly
        // the single-path atomicity the trait promises.
        let mut inner = self.inner.write().await;
        let current = value_at(&inner.root, &segments);
        let next = update(current);
        set_at(&mut inner.root, &segments, next.clone());
        inner.notify(&segments);
        Ok(next)
    }
}
