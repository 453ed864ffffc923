//! Encrypting wrapper over any [`KeyValueStore`].

use super::KeyValueStore;
use crate::utils::crypto::{CryptoError, StringCrypto};
use anyhow::Result;
use async_trait::async_trait;

/// Encrypts values on write and decrypts them on read. Keys stay in clear.
#[derive(Debug)]
pub struct EncryptedStore<S> {
    inner: S,
    crypto: StringCrypto,
}

impl<S: KeyValueStore> EncryptedStore<S> {
    pub fn new(inner: S, encryption_key: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            inner,
            crypto: StringCrypto::new(encryption_key)?,
        })
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for EncryptedStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.inner.get(key).await? {
            Some(encrypted) => Ok(Some(self.crypto.decrypt(&encrypted)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let encrypted = self.crypto.encrypt(value)?;
        self.inner.set(key, &encrypted).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_values_are_encrypted_at_rest() {
        let store = EncryptedStore::new(MemoryStore::new(), "secret-key").unwrap();
        store.set("token", "abc.def.ghi").await.unwrap();

        let raw = store.inner().get("token").await.unwrap().unwrap();
        assert_ne!(raw, "abc.def.ghi");
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("abc.def.ghi"));

        store.remove("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }
}
