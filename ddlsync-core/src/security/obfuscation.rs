//! Reversible password obfuscation for configuration files.
//!
//! The obfuscated form is `base64(nonce || ciphertext || tag)` under AES-256-GCM
//! with a key derived by Argon2id from an application-embedded secret. This
//! keeps passwords out of plain sight in configuration files; it is not a
//! substitute for a secret store since the key ships with the binary.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::sync::OnceLock;
use zeroize::Zeroizing;

use crate::{DdlSyncError, Result};

/// AES-GCM nonce size: 96 bits
const NONCE_SIZE: usize = 12;
/// AES-256 key size
const KEY_SIZE: usize = 32;

const EMBEDDED_SECRET: &[u8] = b"ddlsync/config-password/v1";
const EMBEDDED_SALT: &[u8] = b"ddlsync-static-salt";

static DERIVED_KEY: OnceLock<Zeroizing<[u8; KEY_SIZE]>> = OnceLock::new();

fn derive_key() -> Result<&'static Zeroizing<[u8; KEY_SIZE]>> {
    if let Some(key) = DERIVED_KEY.get() {
        return Ok(key);
    }

    let params = Params::new(19 * 1024, 2, 1, Some(KEY_SIZE)).map_err(|e| DdlSyncError::Obfuscation {
        context: format!("invalid Argon2 parameters: {e}"),
    })?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(EMBEDDED_SECRET, EMBEDDED_SALT, &mut *key)
        .map_err(|e| DdlSyncError::Obfuscation {
            context: format!("key derivation failed: {e}"),
        })?;

    Ok(DERIVED_KEY.get_or_init(|| key))
}

/// Obfuscates a plaintext password for storage in a configuration file.
///
/// Each call uses a fresh random nonce, so the output differs between calls
/// for the same input.
///
/// # Errors
/// Fails if key derivation or encryption fails.
pub fn obscure_password(plain: &str) -> Result<String> {
    let key = derive_key()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plain.as_bytes())
        .map_err(|_| DdlSyncError::Obfuscation {
            context: "encryption failed".to_string(),
        })?;

    let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(payload))
}

/// Recovers a plaintext password from its obfuscated form.
///
/// # Errors
/// Fails if the input is not valid base64, is truncated, or was not produced
/// by [`obscure_password`].
pub fn reveal_password(obscured: &str) -> Result<Zeroizing<String>> {
    let payload = STANDARD
        .decode(obscured.trim())
        .map_err(|e| DdlSyncError::Obfuscation {
            context: format!("invalid encoding: {e}"),
        })?;

    if payload.len() <= NONCE_SIZE {
        return Err(DdlSyncError::Obfuscation {
            context: "payload too short".to_string(),
        });
    }

    let key = derive_key()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let (nonce, ciphertext) = payload.split_at(NONCE_SIZE);

    let plain = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DdlSyncError::Obfuscation {
                context: "password cannot be recovered".to_string(),
            })?,
    );

    String::from_utf8(plain.to_vec())
        .map(Zeroizing::new)
        .map_err(|_| DdlSyncError::Obfuscation {
            context: "password is not valid UTF-8".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obfuscation_round_trip() {
        let obscured = obscure_password("Pa$$w0rd").expect("obfuscation works");
        assert!(!obscured.contains("Pa$$w0rd"));
        let plain = reveal_password(&obscured).expect("recoverable");
        assert_eq!(plain.as_str(), "Pa$$w0rd");
    }

    #[test]
    fn test_obfuscation_uses_fresh_nonce() {
        let first = obscure_password("same").expect("obfuscation works");
        let second = obscure_password("same").expect("obfuscation works");
        assert_ne!(first, second);
    }

    #[test]
    fn test_obfuscation_rejects_tampered_payload() {
        let obscured = obscure_password("secret").expect("obfuscation works");
        let mut bytes = STANDARD.decode(&obscured).expect("valid base64");
        if let Some(last) = bytes.last_mut() {
            *last ^= 0xFF;
        }
        assert!(reveal_password(&STANDARD.encode(bytes)).is_err());
        assert!(reveal_password("not base64!").is_err());
        assert!(reveal_password(&STANDARD.encode([0u8; 4])).is_err());
    }
}
