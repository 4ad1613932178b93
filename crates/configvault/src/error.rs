use configvault_core::{cipher::CipherError, client::StorageError};
use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong while reading or writing a module's config.
///
/// Variants that concern one record carry its key, so messages read as
/// `email-config not found` rather than pointing at an anonymous record.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The module name was empty at construction.
    #[error("module name must not be empty")]
    EmptyModuleName,

    /// `set_config` was handed something other than a JSON object.
    #[error("config should be an object")]
    NotAnObject,

    /// A password was supplied but the vault was built without a cipher.
    #[error("a password was supplied but no payload cipher is configured")]
    CipherUnavailable,

    /// No schema is declared for the module's dialect URI.
    #[error("no schema declared for {context}")]
    SchemaNotFound { context: String },

    /// The declared schema rejected the config.
    #[error("please follow the config schema - {detail}")]
    SchemaViolation { detail: Value },

    /// No record exists under the module's key.
    #[error("{key} not found")]
    NotFound { key: String },

    /// A password was supplied but the stored payload carries no
    /// recognizable encryption marker.
    #[error("{key} is not encrypted, or encrypted with a different algorithm")]
    AlgorithmMismatch { key: String },

    /// The stored payload is encrypted and no password was supplied.
    #[error("{key} is encrypted, please specify a password for decryption")]
    PasswordRequired { key: String },

    /// The payload would not open with this password.
    #[error("could not decrypt {key} with that password")]
    DecryptionFailed { key: String },

    /// The plain payload is not a JSON object.
    #[error("could not parse {key} as unencrypted JSON")]
    ParseFailed { key: String },

    /// Sealing the payload failed before anything was written.
    #[error("could not encrypt {key}")]
    EncryptionFailed {
        key: String,
        #[source]
        source: CipherError,
    },

    /// The config could not be serialized to JSON.
    #[error("could not serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
