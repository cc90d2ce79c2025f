//! # In-Memory KMS
//!
//! A [`KeyManagementGateway`] that keeps `k256` keys in process. Signs like a
//! cloud KMS does: SHA-256 over the raw message, DER output.
//!
//! Cloud KMS services do not normalize `s`, so roughly half of their
//! signatures are high-S. [`InMemoryKms::emit_high_s`] reproduces that on
//! demand; `k256` itself always produces low-S signatures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use k256::pkcs8::EncodePublicKey;
use k256::PublicKey;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::domain::entities::KeyId;
use crate::ports::outbound::{KeyManagementGateway, KmsError};

/// In-process key store implementing the KMS port.
#[derive(Default)]
pub struct InMemoryKms {
    keys: RwLock<HashMap<KeyId, SigningKey>>,
    aliases: RwLock<HashMap<String, KeyId>>,
    high_s: AtomicBool,
}

impl InMemoryKms {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every signature high-S (`s > n/2`), like an un-normalizing KMS.
    pub fn emit_high_s(&self, enabled: bool) {
        self.high_s.store(enabled, Ordering::Relaxed);
    }

    /// Import an existing key under a fresh id.
    pub fn import_key(&self, signing_key: SigningKey) -> KeyId {
        let key_id = KeyId(uuid::Uuid::new_v4().to_string());
        self.keys.write().insert(key_id.clone(), signing_key);
        key_id
    }

    /// Number of keys held.
    pub fn key_count(&self) -> usize {
        self.keys.read().len()
    }

    fn key(&self, key_id: &KeyId) -> Result<SigningKey, KmsError> {
        self.keys
            .read()
            .get(key_id)
            .cloned()
            .ok_or_else(|| KmsError::NotFound(key_id.to_string()))
    }
}

#[async_trait::async_trait]
impl KeyManagementGateway for InMemoryKms {
    async fn create_key(&self) -> Result<KeyId, KmsError> {
        let key_id = self.import_key(SigningKey::random(&mut rand::thread_rng()));
        tracing::debug!(%key_id, "Created in-memory key");
        Ok(key_id)
    }

    async fn public_key_der(&self, key_id: &KeyId) -> Result<Vec<u8>, KmsError> {
        let signing_key = self.key(key_id)?;
        PublicKey::from(signing_key.verifying_key())
            .to_public_key_der()
            .map(|document| document.as_bytes().to_vec())
            .map_err(|e| KmsError::Rejected {
                reason: e.to_string(),
            })
    }

    async fn create_alias(&self, alias: &str, key_id: &KeyId) -> Result<(), KmsError> {
        if !self.keys.read().contains_key(key_id) {
            return Err(KmsError::NotFound(key_id.to_string()));
        }
        let mut aliases = self.aliases.write();
        if aliases.contains_key(alias) {
            return Err(KmsError::Rejected {
                reason: format!("alias {alias} already exists"),
            });
        }
        aliases.insert(alias.to_string(), key_id.clone());
        Ok(())
    }

    async fn resolve_alias(&self, alias: &str) -> Result<KeyId, KmsError> {
        self.aliases
            .read()
            .get(alias)
            .cloned()
            .ok_or_else(|| KmsError::NotFound(alias.to_string()))
    }

    async fn sign(&self, key_id: &KeyId, message: &[u8]) -> Result<Vec<u8>, KmsError> {
        let signing_key = self.key(key_id)?;
        let digest = Sha256::digest(message);

        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| KmsError::Rejected {
                reason: e.to_string(),
            })?;

        // `k256` always returns low-S
        let signature = if self.high_s.load(Ordering::Relaxed) {
            high_s(&signature)?
        } else {
            signature
        };

        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// The `(r, n - s)` twin of a low-S signature.
fn high_s(signature: &Signature) -> Result<Signature, KmsError> {
    let (r, s) = signature.split_scalars();
    Signature::from_scalars(r, -s).map_err(|e| KmsError::Rejected {
        reason: e.to_string(),
    })
}
