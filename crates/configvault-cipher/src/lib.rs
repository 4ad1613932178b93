//! Password-based AES-CCM-128 implementation of the `PayloadCipher` contract.
//!
//! Keys are derived per call with Argon2id over a random salt; the sealed
//! output is a JSON envelope carrying salt, nonce, and ciphertext, all
//! base64-encoded. Nothing in this crate logs, so passwords and plaintext
//! never reach the log stream.

use aes::Aes128;
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ccm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    consts::{U13, U16},
    Ccm,
};
use configvault_core::cipher::{CipherError, PayloadCipher};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// AES-CCM with a 128-bit key, 16-byte tag, and 13-byte nonce.
type Aes128Ccm = Ccm<Aes128, U16, U13>;

const KEY_LEN: usize = 16;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 13;

// Argon2id cost parameters: 64 MiB, 3 passes, 4 lanes.
const ARGON2_M_COST: u32 = 65536;
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

#[derive(Debug, Serialize, Deserialize)]
struct SealedEnvelope {
    salt: String,
    nonce: String,
    ciphertext: String,
}

/// Password-based [`PayloadCipher`] sealing payloads with AES-CCM-128.
///
/// Each seal draws a fresh salt and nonce, so sealing the same payload twice
/// yields different envelopes.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesCcmCipher;

impl AesCcmCipher {
    pub fn new() -> Self {
        Self
    }
}

impl PayloadCipher for AesCcmCipher {
    fn encrypt(&self, password: &str, plaintext: &str) -> Result<String, CipherError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let key = derive_key(password, &salt)?;
        let cipher =
            Aes128Ccm::new_from_slice(key.as_slice()).map_err(|e| CipherError::Encrypt {
                reason: format!("cipher init failed: {e}"),
            })?;
        let ciphertext = cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CipherError::Encrypt {
                reason: format!("seal failed: {e}"),
            })?;

        let envelope = SealedEnvelope {
            salt: STANDARD.encode(salt),
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        };
        serde_json::to_string(&envelope).map_err(|e| CipherError::Encrypt {
            reason: format!("envelope encode failed: {e}"),
        })
    }

    fn decrypt(&self, password: &str, envelope: &str) -> Result<String, CipherError> {
        // A malformed envelope and a wrong password report identically; the
        // caller learns only that this password does not open this payload.
        let envelope: SealedEnvelope =
            serde_json::from_str(envelope).map_err(|_| CipherError::Decrypt)?;
        let salt = STANDARD
            .decode(envelope.salt)
            .map_err(|_| CipherError::Decrypt)?;
        let nonce = STANDARD
            .decode(envelope.nonce)
            .map_err(|_| CipherError::Decrypt)?;
        if nonce.len() != NONCE_LEN {
            return Err(CipherError::Decrypt);
        }
        let ciphertext = STANDARD
            .decode(envelope.ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        let key = derive_key(password, &salt).map_err(|_| CipherError::Decrypt)?;
        let cipher = Aes128Ccm::new_from_slice(key.as_slice()).map_err(|_| CipherError::Decrypt)?;
        let plaintext = cipher
            .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}

fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CipherError> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_LEN)).map_err(
        |e| CipherError::KeyDerivation {
            reason: format!("invalid Argon2 params: {e}"),
        },
    )?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| CipherError::KeyDerivation {
            reason: format!("Argon2id hash failed: {e}"),
        })?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn round_trip_restores_plaintext() {
        let cipher = AesCcmCipher::new();
        let sealed = cipher
            .encrypt("hunter2", r#"{"host":"irc.libera.chat"}"#)
            .expect("encrypt");
        let opened = cipher.decrypt("hunter2", &sealed).expect("decrypt");
        assert_eq!(opened, r#"{"host":"irc.libera.chat"}"#);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let cipher = AesCcmCipher::new();
        let sealed = cipher.encrypt("hunter2", "{}").expect("encrypt");
        let err = cipher.decrypt("*******", &sealed).expect_err("must fail");
        assert_eq!(err, CipherError::Decrypt);
    }

    #[test]
    fn sealing_twice_yields_different_envelopes() {
        let cipher = AesCcmCipher::new();
        let first = cipher.encrypt("hunter2", "{}").expect("first");
        let second = cipher.encrypt("hunter2", "{}").expect("second");
        assert_ne!(first, second);
    }

    #[test]
    fn envelope_is_json_and_hides_the_plaintext() {
        let cipher = AesCcmCipher::new();
        let sealed = cipher
            .encrypt("hunter2", r#"{"nick":"slvrbckt"}"#)
            .expect("encrypt");

        let envelope: Value = serde_json::from_str(&sealed).expect("envelope is JSON");
        for field in ["salt", "nonce", "ciphertext"] {
            assert!(envelope.get(field).is_some(), "missing {field}");
        }
        assert!(!sealed.contains("slvrbckt"), "plaintext must not leak");
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = AesCcmCipher::new();
        let sealed = cipher.encrypt("hunter2", "{}").expect("encrypt");

        let mut envelope: Value = serde_json::from_str(&sealed).expect("envelope");
        envelope["ciphertext"] = Value::String("AAAA".into());
        let tampered = envelope.to_string();

        let err = cipher.decrypt("hunter2", &tampered).expect_err("must fail");
        assert_eq!(err, CipherError::Decrypt);
    }

    #[test]
    fn garbage_envelope_is_rejected() {
        let cipher = AesCcmCipher::new();
        let err = cipher
            .decrypt("hunter2", "not an envelope")
            .expect_err("must fail");
        assert_eq!(err, CipherError::Decrypt);
    }
}
