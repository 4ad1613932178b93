use thiserror::Error;

/// Errors produced by payload cipher implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Deriving a key from the password failed.
    #[error("key derivation failed: {reason}")]
    KeyDerivation { reason: String },
    /// Sealing the payload failed.
    #[error("encryption failed: {reason}")]
    Encrypt { reason: String },
    /// The payload could not be opened with this password.
    ///
    /// Carries no detail; a wrong password and a tampered payload are
    /// indistinguishable to callers.
    #[error("decryption failed")]
    Decrypt,
}

/// Symmetric, password-based sealing of serialized payloads.
///
/// Sealing the same payload twice must produce different envelopes; keys
/// are derived per call.
pub trait PayloadCipher: Send + Sync {
    /// Seal `plaintext` under `password`, returning an opaque envelope.
    fn encrypt(&self, password: &str, plaintext: &str) -> Result<String, CipherError>;

    /// Open `envelope` with `password`, returning the original plaintext.
    fn decrypt(&self, password: &str, envelope: &str) -> Result<String, CipherError>;
}
