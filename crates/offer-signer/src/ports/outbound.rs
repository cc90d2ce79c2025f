//! # Outbound Ports (Driven Ports / SPI)
//!
//! The key-management service that holds the private keys. Network timeouts
//! and retries are the adapter's business.

use crate::domain::entities::KeyId;
use thiserror::Error;

/// Error from KMS operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KmsError {
    /// No key or alias with that name
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The KMS refused the request
    #[error("Request rejected: {reason}")]
    Rejected { reason: String },

    /// Communication error
    #[error("Communication error: {0}")]
    Communication(String),
}

/// Gateway to a key-management service holding secp256k1 keys.
#[async_trait::async_trait]
pub trait KeyManagementGateway: Send + Sync {
    /// Create a new secp256k1 signing key.
    async fn create_key(&self) -> Result<KeyId, KmsError>;

    /// DER `SubjectPublicKeyInfo` of the key.
    async fn public_key_der(&self, key_id: &KeyId) -> Result<Vec<u8>, KmsError>;

    /// Point `alias` at `key_id`.
    async fn create_alias(&self, alias: &str, key_id: &KeyId) -> Result<(), KmsError>;

    /// Look up the key an alias points to.
    async fn resolve_alias(&self, alias: &str) -> Result<KeyId, KmsError>;

    /// Sign `message` with ECDSA over SHA-256 (the KMS hashes the raw
    /// message). Returns an ASN.1 DER signature.
    async fn sign(&self, key_id: &KeyId, message: &[u8]) -> Result<Vec<u8>, KmsError>;
}
