//! String encryption/decryption using AES-256-GCM.
//!
//! ## Usage
//!
//! ```ignore
//! let crypto = StringCrypto::new(&config.encryption_key)?;
//! let encrypted = crypto.encrypt("secret data")?;
//! let decrypted = crypto.decrypt(&encrypted)?;
//! ```

use aes_gcm::aead::rand_core::{OsRng, RngCore};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid encryption key")]
    InvalidKey,
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed")]
    DecryptionFailed,
    #[error("Invalid data format")]
    InvalidData,
}

/// AES-256-GCM encryption/decryption for strings.
#[derive(Clone)]
pub struct StringCrypto {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for StringCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringCrypto").finish_non_exhaustive()
    }
}

impl StringCrypto {
    /// Builds a cipher from `key_str`.
    ///
    /// A 44 character key is read as base64; anything else is used as raw
    /// bytes, zero padded or truncated to 32 bytes.
    pub fn new(key_str: &str) -> Result<Self, CryptoError> {
        if key_str.is_empty() {
            return Err(CryptoError::InvalidKey);
        }

        let key_bytes = if key_str.len() == 44 {
            general_purpose::STANDARD
                .decode(key_str)
                .map_err(|_| CryptoError::InvalidKey)?
        } else {
            let mut bytes = vec![0u8; 32];
            let input_bytes = key_str.as_bytes();
            let copy_len = std::cmp::min(input_bytes.len(), 32);
            bytes[..copy_len].copy_from_slice(&input_bytes[..copy_len]);
            bytes
        };

        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey);
        }

        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypts a string and returns base64(nonce || ciphertext).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(result))
    }

    /// Decrypts a value produced by [`StringCrypto::encrypt`].
    pub fn decrypt(&self, encrypted_data: &str) -> Result<String, CryptoError> {
        let data = general_purpose::STANDARD
            .decode(encrypted_data)
            .map_err(|_| CryptoError::InvalidData)?;

        if data.len() < NONCE_LEN {
            return Err(CryptoError::InvalidData);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidData)
    }
}

/// Generates a new base64-encoded 256-bit encryption key.
#[cfg(test)]
pub(crate) fn generate_key() -> String {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    general_purpose::STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let crypto = StringCrypto::new("raw-test-key").unwrap();
        let encrypted = crypto.encrypt("Test message").unwrap();
        assert_eq!(crypto.decrypt(&encrypted).unwrap(), "Test message");
    }

    #[test]
    fn test_unique_nonces() {
        let crypto = StringCrypto::new(&generate_key()).unwrap();
        let enc1 = crypto.encrypt("Same message").unwrap();
        let enc2 = crypto.encrypt("Same message").unwrap();

        assert_ne!(enc1, enc2);
        assert_eq!(crypto.decrypt(&enc1).unwrap(), "Same message");
        assert_eq!(crypto.decrypt(&enc2).unwrap(), "Same message");
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = StringCrypto::new("key-a").unwrap();
        let b = StringCrypto::new("key-b").unwrap();
        let encrypted = a.encrypt("secret").unwrap();

        assert!(matches!(b.decrypt(&encrypted), Err(CryptoError::DecryptionFailed)));
        assert!(matches!(a.decrypt("!!"), Err(CryptoError::InvalidData)));
        assert!(matches!(StringCrypto::new(""), Err(CryptoError::InvalidKey)));
    }
}
