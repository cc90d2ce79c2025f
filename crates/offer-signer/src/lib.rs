//! # Offer Signer
//!
//! KMS-backed secp256k1 signing for token-offer deploys.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): DER → `r||s` codec, low-S normalization,
//!   public key compression. No I/O.
//! - **Ports Layer** (`ports/`): Key service API and the KMS gateway trait
//! - **Adapters** (`adapters/`): In-process KMS
//! - **Service Layer** (`service.rs`): Wires the KMS to the codec
//!
//! ## Signature Format
//!
//! KMS services return ECDSA signatures as ASN.1 DER with variable-width
//! integers. The chain expects `prefix || r || s` with 32-byte big-endian
//! components and `s <= n/2`. See [`SignatureCodec`].

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::memory::InMemoryKms;
pub use config::{parse_signature_prefix, ConfigError, SignerConfig};
pub use domain::codec::{CodecConfig, SignatureCodec};
pub use domain::curve::{
    is_high_s, normalize_s, normalize_s_hex, SECP256K1_HALF_ORDER, SECP256K1_ORDER,
};
pub use domain::entities::{
    Approval, CanonicalSignature, Decoded, DeployHash, KeyAlgorithm, KeyId, KeyPair,
    SignatureForm, CANONICAL_SIGNATURE_LEN, DEPLOY_HASH_LEN,
};
pub use domain::errors::{CodecError, CodecErrorKind, Component, PublicKeyError};
pub use domain::public_key::CompressedPublicKey;
pub use ports::inbound::{KeyServiceApi, KeyServiceError, KeyServiceErrorKind, ServiceFault};
pub use ports::outbound::{KeyManagementGateway, KmsError};
pub use service::{alias_for, KeyService};
