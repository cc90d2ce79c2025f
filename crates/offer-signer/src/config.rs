//! Signer configuration from environment variables.

use std::env;

use thiserror::Error;

use crate::domain::codec::CodecConfig;
use crate::domain::entities::KeyAlgorithm;

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A hex-valued variable did not contain hex
    #[error("{var} must be hex: {reason}")]
    InvalidHex {
        /// Variable name
        var: &'static str,
        /// Decoder message
        reason: String,
    },

    /// A signature prefix starting with the DER SEQUENCE tag could make a
    /// DER signature of matching length read as `prefix || r || s`
    #[error("{var} must not start with 0x30 (DER SEQUENCE tag)")]
    AmbiguousPrefix {
        /// Variable name
        var: &'static str,
    },

    /// `OFFER_KEY_ALGORITHM` named an unsupported algorithm
    #[error("Unsupported key algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Configuration for the key service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    /// Bytes placed in front of every `r||s` signature (empty by default)
    pub signature_prefix: Vec<u8>,

    /// Hex placed in front of published public keys (empty by default)
    pub public_key_prefix: String,

    /// Key algorithm, decides the approval tag
    pub algorithm: KeyAlgorithm,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            signature_prefix: Vec::new(),
            public_key_prefix: String::new(),
            algorithm: KeyAlgorithm::Secp256k1,
        }
    }
}

impl SignerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OFFER_SIGNATURE_PREFIX`: Hex prefix for signatures (default: empty)
    /// - `OFFER_PUBLIC_KEY_PREFIX`: Hex prefix for public keys (default: empty)
    /// - `OFFER_KEY_ALGORITHM`: Key algorithm (default: secp256k1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let signature_prefix = match env::var("OFFER_SIGNATURE_PREFIX") {
            Ok(value) => parse_signature_prefix(&value)?,
            Err(_) => Vec::new(),
        };

        let public_key_prefix = match env::var("OFFER_PUBLIC_KEY_PREFIX") {
            Ok(value) => parse_public_key_prefix(&value)?,
            Err(_) => String::new(),
        };

        let algorithm = match env::var("OFFER_KEY_ALGORITHM") {
            Ok(name) => parse_algorithm(&name)?,
            Err(_) => KeyAlgorithm::Secp256k1,
        };

        Ok(Self {
            signature_prefix,
            public_key_prefix,
            algorithm,
        })
    }

    /// Codec settings derived from this configuration.
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            signature_prefix: self.signature_prefix.clone(),
        }
    }
}

/// Parse a hex signature prefix.
///
/// Rejects odd-length or non-hex input, and prefixes whose first byte is the
/// DER SEQUENCE tag `0x30`.
pub fn parse_signature_prefix(value: &str) -> Result<Vec<u8>, ConfigError> {
    let prefix = hex::decode(value.trim()).map_err(|e| ConfigError::InvalidHex {
        var: "OFFER_SIGNATURE_PREFIX",
        reason: e.to_string(),
    })?;
    if prefix.first() == Some(&0x30) {
        return Err(ConfigError::AmbiguousPrefix {
            var: "OFFER_SIGNATURE_PREFIX",
        });
    }
    Ok(prefix)
}

fn parse_public_key_prefix(value: &str) -> Result<String, ConfigError> {
    let prefix = value.trim();
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidHex {
            var: "OFFER_PUBLIC_KEY_PREFIX",
            reason: format!("{prefix:?} contains non-hex digits"),
        });
    }
    Ok(prefix.to_ascii_lowercase())
}

fn parse_algorithm(name: &str) -> Result<KeyAlgorithm, ConfigError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "secp256k1" => Ok(KeyAlgorithm::Secp256k1),
        _ => Err(ConfigError::UnknownAlgorithm(name.to_string())),
    }
}
