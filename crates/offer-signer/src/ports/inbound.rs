//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of the key service.

use std::fmt;

use thiserror::Error;

use crate::domain::entities::{Approval, DeployHash, KeyPair};
use crate::domain::errors::{CodecError, PublicKeyError};
use crate::ports::outbound::KmsError;

/// What kind of request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyServiceErrorKind {
    /// The caller sent something unusable (bad deploy hash, bad key)
    InvalidRequest,
    /// Creating or publishing a key failed
    KeyGeneration,
    /// Producing a signature failed
    Signing,
}

impl KeyServiceErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyServiceErrorKind::InvalidRequest => "invalid_request",
            KeyServiceErrorKind::KeyGeneration => "key_generation",
            KeyServiceErrorKind::Signing => "signing",
        }
    }
}

impl fmt::Display for KeyServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying failure carried by a [`KeyServiceError`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceFault {
    /// The KMS call failed
    #[error(transparent)]
    Kms(#[from] KmsError),

    /// The KMS signature could not be converted
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The KMS public key could not be read
    #[error(transparent)]
    PublicKey(#[from] PublicKeyError),
}

/// Key service failure: a kind tag, a human readable message and the
/// structured cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct KeyServiceError {
    kind: KeyServiceErrorKind,
    message: String,
    #[source]
    fault: Option<ServiceFault>,
}

impl KeyServiceError {
    /// Build an error with an optional cause.
    pub fn new(
        kind: KeyServiceErrorKind,
        message: impl Into<String>,
        fault: Option<ServiceFault>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            fault,
        }
    }

    /// Rejected input.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(KeyServiceErrorKind::InvalidRequest, message, None)
    }

    /// Key creation failure.
    pub fn key_generation(message: impl Into<String>, fault: impl Into<ServiceFault>) -> Self {
        Self::new(KeyServiceErrorKind::KeyGeneration, message, Some(fault.into()))
    }

    /// Signing failure.
    pub fn signing(message: impl Into<String>, fault: impl Into<ServiceFault>) -> Self {
        Self::new(KeyServiceErrorKind::Signing, message, Some(fault.into()))
    }

    /// Error kind.
    pub fn kind(&self) -> KeyServiceErrorKind {
        self.kind
    }

    /// Human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured cause, if any.
    pub fn fault(&self) -> Option<&ServiceFault> {
        self.fault.as_ref()
    }
}

/// Primary key service API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait::async_trait]
pub trait KeyServiceApi: Send + Sync {
    /// Create a KMS key and publish it under an alias derived from its
    /// compressed public key.
    async fn generate_keypair(&self) -> Result<KeyPair, KeyServiceError>;

    /// Sign a base64 deploy hash with the key aliased by `public_key_hex`.
    ///
    /// Returns the base64 of `prefix || r || s`.
    async fn sign(
        &self,
        deploy_hash_base64: &str,
        public_key_hex: &str,
    ) -> Result<String, KeyServiceError>;

    /// Sign a deploy hash and build the approval entry for the deploy.
    async fn approve(
        &self,
        deploy_hash: &DeployHash,
        key_pair: &KeyPair,
    ) -> Result<Approval, KeyServiceError>;
}
