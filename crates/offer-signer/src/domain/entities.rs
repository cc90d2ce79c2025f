//! # Domain Entities
//!
//! Core data structures shared by the codec and the key service.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{
    GeneralPurpose, GeneralPurposeConfig, STANDARD as BASE64,
};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use super::curve::SCALAR_LEN;

/// Length of a fixed-width `r||s` signature.
pub const CANONICAL_SIGNATURE_LEN: usize = 2 * SCALAR_LEN;

/// Length of a deploy hash (blake2b-256).
pub const DEPLOY_HASH_LEN: usize = 32;

/// Standard-alphabet base64 decoder that accepts missing or short `=`
/// padding. KMS payloads relayed through other services lose trailing `=`.
pub(crate) const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// =============================================================================
// Signatures
// =============================================================================

/// Fixed-width ECDSA signature: `r` (32 bytes) followed by `s` (32 bytes),
/// both big-endian and zero padded. Also known as the P1363 encoding.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalSignature(#[serde_as(as = "Bytes")] [u8; CANONICAL_SIGNATURE_LEN]);

impl CanonicalSignature {
    /// Wrap raw `r||s` bytes.
    pub fn from_bytes(bytes: [u8; CANONICAL_SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Assemble from separate components.
    pub fn from_components(r: &[u8; SCALAR_LEN], s: &[u8; SCALAR_LEN]) -> Self {
        let mut bytes = [0u8; CANONICAL_SIGNATURE_LEN];
        bytes[..SCALAR_LEN].copy_from_slice(r);
        bytes[SCALAR_LEN..].copy_from_slice(s);
        Self(bytes)
    }

    /// Raw `r||s` bytes.
    pub fn as_bytes(&self) -> &[u8; CANONICAL_SIGNATURE_LEN] {
        &self.0
    }

    /// The `r` half.
    pub fn r(&self) -> &[u8] {
        &self.0[..SCALAR_LEN]
    }

    /// The `s` half.
    pub fn s(&self) -> &[u8] {
        &self.0[SCALAR_LEN..]
    }

    /// Lowercase hex of `r||s`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CanonicalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CanonicalSignature")
            .field(&self.to_hex())
            .finish()
    }
}

/// How a signature arrived at the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureForm {
    /// Already `r||s`, passed through untouched
    Canonical,
    /// ASN.1 DER; the flags record which integers carried a sign pad byte
    Der {
        /// `r` was encoded with a leading `0x00`
        r_padded: bool,
        /// `s` was encoded with a leading `0x00`
        s_padded: bool,
    },
}

impl SignatureForm {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureForm::Canonical => "canonical",
            SignatureForm::Der { .. } => "der",
        }
    }
}

/// Result of a detailed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// The fixed-width signature
    pub signature: CanonicalSignature,
    /// Input form
    pub form: SignatureForm,
    /// `s` was replaced by `n - s`
    pub s_normalized: bool,
}

// =============================================================================
// Deploys and keys
// =============================================================================

/// Hash of a deploy, the message handed to the KMS.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeployHash([u8; DEPLOY_HASH_LEN]);

impl DeployHash {
    /// Wrap raw hash bytes.
    pub fn from_bytes(bytes: [u8; DEPLOY_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; DEPLOY_HASH_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Parse a base64 encoded hash. Returns `None` if the input is not
    /// base64 or not 32 bytes long.
    pub fn from_base64(encoded: &str) -> Option<Self> {
        BASE64_LENIENT
            .decode(encoded)
            .ok()
            .and_then(|bytes| Self::from_slice(&bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; DEPLOY_HASH_LEN] {
        &self.0
    }

    /// Base64 form, as sent to the KMS.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Display for DeployHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for DeployHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeployHash({self})")
    }
}

/// Identifier of a key inside the KMS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub String);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signature algorithms understood by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// ECDSA over secp256k1
    Secp256k1,
}

impl KeyAlgorithm {
    /// One-byte algorithm tag, in hex, placed in front of keys and
    /// signatures in deploy approvals.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyAlgorithm::Secp256k1 => "02",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

/// A KMS-held key, addressed by its public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// Key identifier handed back to callers (the public key hex)
    pub id: String,
    /// Algorithm name
    #[serde(rename = "type")]
    pub key_type: KeyAlgorithm,
    /// Compressed public key in hex, without the algorithm tag
    pub public_key_hex: String,
}

impl KeyPair {
    /// Public key with the algorithm tag in front, as it appears on chain.
    pub fn tagged_public_key(&self) -> String {
        format!("{}{}", self.key_type.tag(), self.public_key_hex)
    }
}

/// Signer/signature pair attached to a deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Tagged public key hex
    pub signer: String,
    /// Tagged signature hex
    pub signature: String,
}
