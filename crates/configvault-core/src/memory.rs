use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    client::{ChangeEvent, ChangeListener, ListenerSet, RemoteDocument, StorageClient, StorageError},
    schema::{SchemaError, SchemaRegistry},
};

/// In-memory [`StorageClient`] for tests and ephemeral setups.
///
/// Records live in a map, change events fire synchronously on write, and
/// `max_age` is ignored because the map is always authoritative.
#[derive(Default)]
pub struct MemoryStorageClient {
    records: Mutex<HashMap<String, RemoteDocument>>,
    schemas: SchemaRegistry,
    listeners: ListenerSet,
}

impl MemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a schema for a dialect URI.
    pub fn declare_schema<F>(&self, context_uri: impl Into<String>, check: F)
    where
        F: Fn(&Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        self.schemas.declare(context_uri, check);
    }

    /// Raw stored record, for assertions on the wire format.
    pub fn document(&self, key: &str) -> Option<RemoteDocument> {
        let records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.get(key).cloned()
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn read(
        &self,
        key: &str,
        _max_age: Option<Duration>,
    ) -> Result<Option<RemoteDocument>, StorageError> {
        let records = self.records.lock().map_err(|err| StorageError::Backend {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(records.get(key).cloned())
    }

    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: String,
    ) -> Result<(), StorageError> {
        {
            let mut records = self.records.lock().map_err(|err| StorageError::Backend {
                reason: format!("lock poisoned: {err}"),
            })?;
            records.insert(
                key.to_owned(),
                RemoteDocument {
                    data: body,
                    content_type: content_type.to_owned(),
                },
            );
        }
        // Dispatch outside the lock so listeners may read back.
        self.listeners.emit(&ChangeEvent {
            path: key.to_owned(),
        });
        Ok(())
    }

    fn validate(&self, document: &Value) -> Result<(), SchemaError> {
        self.schemas.validate(document)
    }

    fn on_change(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }
}
