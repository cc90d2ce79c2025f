//! # Codec Errors
//!
//! Error types for signature and public-key conversion.

use std::fmt;
use thiserror::Error;

/// Which half of an `r||s` signature an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The `r` integer
    R,
    /// The `s` integer
    S,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::R => write!(f, "r"),
            Component::S => write!(f, "s"),
        }
    }
}

/// Coarse classification of [`CodecError`], used for metrics labels and by
/// callers that only need to know which stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// Malformed base64 or empty payload
    Decode,
    /// Payload below the 64-byte minimum
    TooShort,
    /// ASN.1 structure is not `SEQUENCE { INTEGER, INTEGER }`
    InvalidSequence,
    /// An integer field is not a usable secp256k1 scalar
    InvalidInteger,
}

impl CodecErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecErrorKind::Decode => "decode",
            CodecErrorKind::TooShort => "too_short",
            CodecErrorKind::InvalidSequence => "invalid_sequence",
            CodecErrorKind::InvalidInteger => "invalid_integer",
        }
    }
}

/// Errors that can occur while converting a signature to `r||s`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// No signature data was provided
    #[error("No signature data provided to convert")]
    EmptyPayload,

    /// The payload is not valid base64
    #[error("Invalid base64 signature: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload is shorter than a fixed-width signature
    #[error("The signature provided is too short: {actual} bytes, minimum {minimum}")]
    TooShort {
        /// Decoded length in bytes
        actual: usize,
        /// Minimum accepted length in bytes
        minimum: usize,
    },

    /// A multiple of 64 bytes that is not a single `r||s` pair
    #[error("Unexpected canonical signature length: {0} bytes")]
    UnexpectedLength(usize),

    /// The payload is not a DER `SEQUENCE { INTEGER r, INTEGER s }`
    #[error("Error while trying to decode ASN.1 from signature: {0}")]
    InvalidSequence(String),

    /// An integer is empty, too wide, or not below the curve order
    #[error("Invalid {component} value: {reason}")]
    InvalidInteger {
        /// Offending component
        component: Component,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A hex-encoded scalar could not be parsed
    #[error("Invalid hex scalar: {0}")]
    InvalidHex(String),
}

impl CodecError {
    /// Classify this error.
    pub fn kind(&self) -> CodecErrorKind {
        match self {
            CodecError::EmptyPayload | CodecError::Base64(_) => CodecErrorKind::Decode,
            CodecError::TooShort { .. } => CodecErrorKind::TooShort,
            CodecError::UnexpectedLength(_) | CodecError::InvalidSequence(_) => {
                CodecErrorKind::InvalidSequence
            }
            CodecError::InvalidInteger { .. } | CodecError::InvalidHex(_) => {
                CodecErrorKind::InvalidInteger
            }
        }
    }
}

impl From<der::Error> for CodecError {
    fn from(err: der::Error) -> Self {
        CodecError::InvalidSequence(err.to_string())
    }
}

/// Errors that can occur while reading a secp256k1 public key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublicKeyError {
    /// No key bytes were provided
    #[error("Expected secp256k1 public key, but got an empty byte array")]
    Empty,

    /// Neither a 33-byte compressed nor a 65-byte uncompressed SEC1 point
    #[error("Expected secp256k1 public key, but received {len} bytes with tag {tag:#04x}")]
    WrongFormat {
        /// Length of the input
        len: usize,
        /// First byte of the input
        tag: u8,
    },

    /// Well-formed encoding of a point that is not on the curve
    #[error("Public key is not a valid secp256k1 point")]
    InvalidPoint,

    /// SubjectPublicKeyInfo could not be decoded
    #[error("Invalid SubjectPublicKeyInfo: {0}")]
    Spki(String),
}
