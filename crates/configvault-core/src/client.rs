use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::SchemaError;

/// Errors produced by storage client implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O failure: {reason}")]
    Io { reason: String },
    /// A stored record exists but could not be decoded.
    #[error("corrupt record: {reason}")]
    Corrupt { reason: String },
    /// Any other backend failure.
    #[error("storage failure: {reason}")]
    Backend { reason: String },
}

/// A stored payload together with its content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub data: String,
    pub content_type: String,
}

/// Describes a changed record; `path` is the record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
}

/// Callback invoked synchronously for every change event.
pub type ChangeListener = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Contract for the per-user key-value store a vault persists into.
///
/// One logical record per key; writes overwrite. Schema validation is keyed
/// by the document's `@context` dialect URI, which is why callers tag before
/// validating.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Read the record stored under `key`.
    ///
    /// Resolves `Ok(None)` when no record exists. `max_age` bounds how stale
    /// a cached copy may be; authoritative backends ignore it.
    async fn read(
        &self,
        key: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<RemoteDocument>, StorageError>;

    /// Write a record under `key`, overwriting any existing one.
    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: String,
    ) -> Result<(), StorageError>;

    /// Validate a document against the schema declared for its dialect.
    fn validate(&self, document: &Value) -> Result<(), SchemaError>;

    /// Register a listener dispatched synchronously on every change event.
    fn on_change(&self, listener: ChangeListener);
}

/// Synchronous, registration-ordered change fan-out shared by backends.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<Arc<dyn Fn(&ChangeEvent) + Send + Sync>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: ChangeListener) {
        self.lock().push(Arc::from(listener));
    }

    /// Dispatch `event` to every listener, in registration order.
    pub fn emit(&self, event: &ChangeEvent) {
        // Snapshot so a listener may register further listeners.
        let snapshot: Vec<_> = self.lock().clone();
        for listener in snapshot {
            listener(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Fn(&ChangeEvent) + Send + Sync>>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            // The vec is append-only, so a poisoned lock still holds valid state.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
