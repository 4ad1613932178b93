use std::{sync::Arc, time::Duration};

use configvault_core::{
    cipher::PayloadCipher,
    client::{ChangeEvent, StorageClient},
    schema::SchemaError,
};
use serde_json::{Map, Value};
use tokio::sync::Notify;
use tracing::instrument;

use crate::{
    context::{context_uri, record_key},
    error::VaultError,
    payload::{self, CONTENT_TYPE_JSON},
    registry::{ChangeRegistry, Subscription},
};

/// How stale a cached record may be when `once_config` polls for it.
const ONCE_CONFIG_MAX_AGE: Duration = Duration::from_secs(20);

/// State shared between vault handles and the storage client's listener.
struct VaultShared {
    record_key: String,
    context_uri: String,
    handlers: Arc<ChangeRegistry>,
    changed: Notify,
}

/// One module's config/credentials record in a per-user key-value store.
///
/// A vault owns the record `<module>-config`: it tags stored objects with
/// the module's `@context` dialect, validates them against the schema the
/// client declares, optionally seals them with a password, and tells
/// subscribers when the record changes. Handles are cheap to clone and
/// share their subscriptions.
pub struct ConfigVault<C> {
    client: Arc<C>,
    cipher: Option<Arc<dyn PayloadCipher>>,
    shared: Arc<VaultShared>,
}

impl<C> Clone for ConfigVault<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cipher: self.cipher.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: StorageClient> ConfigVault<C> {
    /// Build a vault for `module_name` without encryption support.
    pub fn new(module_name: &str, client: Arc<C>) -> Result<Self, VaultError> {
        Self::build(module_name, client, None)
    }

    /// Build a vault that seals and opens payloads with `cipher` whenever a
    /// password is supplied.
    pub fn with_cipher(
        module_name: &str,
        client: Arc<C>,
        cipher: Arc<dyn PayloadCipher>,
    ) -> Result<Self, VaultError> {
        Self::build(module_name, client, Some(cipher))
    }

    fn build(
        module_name: &str,
        client: Arc<C>,
        cipher: Option<Arc<dyn PayloadCipher>>,
    ) -> Result<Self, VaultError> {
        if module_name.is_empty() {
            return Err(VaultError::EmptyModuleName);
        }

        let shared = Arc::new(VaultShared {
            record_key: record_key(module_name),
            context_uri: context_uri(module_name),
            handlers: Arc::new(ChangeRegistry::default()),
            changed: Notify::new(),
        });

        // The client listener holds the shared state weakly, so once every
        // handle is dropped the listener goes quiet.
        let weak = Arc::downgrade(&shared);
        client.on_change(Box::new(move |event: &ChangeEvent| {
            if let Some(shared) = weak.upgrade() {
                if event.path == shared.record_key {
                    shared.handlers.dispatch();
                    shared.changed.notify_waiters();
                }
            }
        }));

        Ok(Self {
            client,
            cipher,
            shared,
        })
    }

    /// Key of the record this vault reads and writes.
    pub fn record_key(&self) -> &str {
        &self.shared.record_key
    }

    /// Dialect URI stamped into stored configs.
    pub fn context_uri(&self) -> &str {
        &self.shared.context_uri
    }

    /// Store `config` as this module's config record.
    ///
    /// The caller's object is left untouched: a private copy is tagged with
    /// the module's `@context` dialect, validated against the schema the
    /// client declares, serialized, optionally sealed under `password`, and
    /// written as `application/json`.
    #[instrument(skip_all, fields(key = %self.shared.record_key))]
    pub async fn set_config(
        &self,
        password: Option<&str>,
        config: &Value,
    ) -> Result<(), VaultError> {
        let map = config.as_object().ok_or(VaultError::NotAnObject)?;
        if password.is_some() {
            self.require_cipher()?;
        }

        let mut tagged = map.clone();
        tagged.insert(
            "@context".to_owned(),
            Value::String(self.shared.context_uri.clone()),
        );
        let tagged = Value::Object(tagged);
        self.validate(&tagged)?;

        let json = serde_json::to_string(&tagged)?;
        let body = payload::seal(
            &self.shared.record_key,
            json,
            password,
            self.cipher.as_deref(),
        )?;
        self.client
            .write(&self.shared.record_key, CONTENT_TYPE_JSON, body)
            .await?;
        Ok(())
    }

    /// Fetch the module's config record.
    ///
    /// With a password the stored payload must carry the algorithm marker
    /// and open under that password; without one it must be plain JSON.
    /// The returned object never contains the `@context` tag. `max_age`
    /// bounds how stale a cached record may be, for backends that cache.
    #[instrument(skip_all, fields(key = %self.shared.record_key))]
    pub async fn get_config(
        &self,
        password: Option<&str>,
        max_age: Option<Duration>,
    ) -> Result<Map<String, Value>, VaultError> {
        if password.is_some() {
            self.require_cipher()?;
        }

        let document = self
            .client
            .read(&self.shared.record_key, max_age)
            .await?
            .ok_or_else(|| VaultError::NotFound {
                key: self.shared.record_key.clone(),
            })?;
        payload::open(
            &self.shared.record_key,
            &document.data,
            password,
            self.cipher.as_deref(),
        )
    }

    /// Fetch the module's config, or wait until a usable one is stored.
    ///
    /// Only a missing record makes this wait; every other failure (wrong
    /// password, unparseable payload, backend trouble) is returned
    /// immediately. The wait is unbounded, so callers that need a deadline
    /// wrap the future in `tokio::time::timeout`.
    pub async fn once_config(
        &self,
        password: Option<&str>,
    ) -> Result<Map<String, Value>, VaultError> {
        loop {
            // Arm before reading so a write that lands between the read and
            // the wait still wakes us.
            let notified = self.shared.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.get_config(password, Some(ONCE_CONFIG_MAX_AGE)).await {
                Err(VaultError::NotFound { .. }) => notified.await,
                result => return result,
            }
        }
    }

    /// Run `handler` whenever this module's config record changes.
    ///
    /// The handler is invoked synchronously and without arguments; read the
    /// new value with [`Self::get_config`]. It stays registered for as long
    /// as the returned [`Subscription`] is held.
    pub fn on_change(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        ChangeRegistry::subscribe(&self.shared.handlers, handler)
    }

    fn require_cipher(&self) -> Result<&dyn PayloadCipher, VaultError> {
        self.cipher.as_deref().ok_or(VaultError::CipherUnavailable)
    }

    fn validate(&self, document: &Value) -> Result<(), VaultError> {
        self.client.validate(document).map_err(|err| match err {
            SchemaError::NotDeclared => VaultError::SchemaNotFound {
                context: self.shared.context_uri.clone(),
            },
            SchemaError::Violation { detail } => VaultError::SchemaViolation { detail },
        })
    }
}
