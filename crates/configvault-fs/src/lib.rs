//! File-backed implementation of the `StorageClient` contract.
//!
//! One record per file under a root directory, written atomically via a
//! named temp file. The store is authoritative, so `max_age` is ignored.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use configvault_core::{
    client::{ChangeEvent, ChangeListener, ListenerSet, RemoteDocument, StorageClient, StorageError},
    schema::{SchemaError, SchemaRegistry},
};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::instrument;

/// Per-user key-value store persisted as one file per record.
pub struct FileStorageClient {
    root: PathBuf,
    schemas: SchemaRegistry,
    listeners: ListenerSet,
}

impl FileStorageClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            schemas: SchemaRegistry::new(),
            listeners: ListenerSet::new(),
        }
    }

    /// Declare a schema for a dialect URI.
    pub fn declare_schema<F>(&self, context_uri: impl Into<String>, check: F)
    where
        F: Fn(&Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        self.schemas.declare(context_uri, check);
    }

    /// Directory the records live in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

#[async_trait]
impl StorageClient for FileStorageClient {
    #[instrument(skip_all, fields(key))]
    async fn read(
        &self,
        key: &str,
        _max_age: Option<Duration>,
    ) -> Result<Option<RemoteDocument>, StorageError> {
        read_record(&self.path_for(key))
    }

    #[instrument(skip_all, fields(key))]
    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: String,
    ) -> Result<(), StorageError> {
        let record = RemoteDocument {
            data: body,
            content_type: content_type.to_owned(),
        };
        write_record(&self.path_for(key), &record)?;
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

fn write_record(path: &Path, record: &RemoteDocument) -> Result<(), StorageError> {
    let parent = path.parent().ok_or_else(|| StorageError::Io {
        reason: "invalid storage path".to_string(),
    })?;
    fs::create_dir_all(parent).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
    let json = serde_json::to_vec(record).map_err(|e| StorageError::Backend {
        reason: format!("record encode failed: {e}"),
    })?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

fn read_record(path: &Path) -> Result<Option<RemoteDocument>, StorageError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(err)),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(io_err)?;
    serde_json::from_slice(&buf)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            reason: format!("record decode failed: {e}"),
        })
}

fn sanitize_key(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key)
}

fn io_err(err: impl ToString) -> StorageError {
    StorageError::Io {
        reason: err.to_string(),
    }
}
