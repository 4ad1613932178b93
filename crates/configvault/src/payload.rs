//! Wire form of a stored config payload.
//!
//! Plain payloads are the JSON text itself; sealed payloads are the cipher
//! envelope behind an algorithm marker, so a reader can tell the two apart
//! before attempting to parse.

use configvault_core::cipher::PayloadCipher;
use serde_json::{Map, Value};

use crate::error::VaultError;

/// Marker prefixed to encrypted payloads.
pub const ALGORITHM_PREFIX: &str = "AES-CCM-128:";

/// Content type of every stored record.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Seal `json` under `password`, or pass it through untouched.
pub(crate) fn seal(
    key: &str,
    json: String,
    password: Option<&str>,
    cipher: Option<&dyn PayloadCipher>,
) -> Result<String, VaultError> {
    let pwd = match password {
        Some(pwd) => pwd,
        None => return Ok(json),
    };
    let cipher = cipher.ok_or(VaultError::CipherUnavailable)?;
    let sealed = cipher
        .encrypt(pwd, &json)
        .map_err(|source| VaultError::EncryptionFailed {
            key: key.to_owned(),
            source,
        })?;
    Ok(format!("{ALGORITHM_PREFIX}{sealed}"))
}

/// Open a stored payload: unseal if a password is given, parse, and strip
/// the `@context` tag.
pub(crate) fn open(
    key: &str,
    data: &str,
    password: Option<&str>,
    cipher: Option<&dyn PayloadCipher>,
) -> Result<Map<String, Value>, VaultError> {
    let mut map = match password {
        Some(pwd) => {
            let sealed = data.strip_prefix(ALGORITHM_PREFIX).ok_or_else(|| {
                VaultError::AlgorithmMismatch {
                    key: key.to_owned(),
                }
            })?;
            let cipher = cipher.ok_or(VaultError::CipherUnavailable)?;
            let json = cipher
                .decrypt(pwd, sealed)
                .map_err(|_| VaultError::DecryptionFailed {
                    key: key.to_owned(),
                })?;
            parse_object(&json).ok_or_else(|| VaultError::DecryptionFailed {
                key: key.to_owned(),
            })?
        }
        None => {
            if data.starts_with(ALGORITHM_PREFIX) {
                return Err(VaultError::PasswordRequired {
                    key: key.to_owned(),
                });
            }
            parse_object(data).ok_or_else(|| VaultError::ParseFailed {
                key: key.to_owned(),
            })?
        }
    };
    map.remove("@context");
    Ok(map)
}

fn parse_object(json: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(json) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
