//! # Signature Codec (ASN.1 DER → r||s)
//!
//! KMS services return ECDSA signatures as ASN.1 DER:
//!
//! ```text
//! 30 <len>
//!    02 <len> <r bytes>   -- INTEGER r
//!    02 <len> <s bytes>   -- INTEGER s
//! ```
//!
//! The chain wants the fixed-width `r||s` form instead. DER integers are
//! minimal and signed, so a 32-byte scalar can show up as 31 bytes (leading
//! zero dropped) or 33 bytes (a `0x00` sign pad in front of a byte with the
//! high bit set). The codec undoes both and brings `s` into the low half of
//! the curve order.
//!
//! ## Invariants
//!
//! - Every successful decode yields exactly 64 bytes.
//! - `r` and `s` are each below the curve order.
//! - Output `s` is at most `n/2`.
//! - A 64-byte input is already canonical and is returned unchanged, so
//!   decoding is idempotent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use der::asn1::AnyRef;
use der::{Decode, Reader, SliceReader, Tag, Tagged};
use primitive_types::U256;

use super::curve::{normalize_s, SCALAR_LEN, SECP256K1_ORDER};
use super::entities::{
    CanonicalSignature, Decoded, SignatureForm, BASE64_LENIENT, CANONICAL_SIGNATURE_LEN,
};
use super::errors::{CodecError, Component};

/// Codec configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecConfig {
    /// Bytes placed in front of `r||s` when encoding. Empty by default.
    ///
    /// On decode, input of exactly `prefix.len() + 64` bytes that starts with
    /// the prefix is read as `prefix || r || s`. A prefix starting with `0x30`
    /// would also match some DER signatures, so
    /// [`parse_signature_prefix`](crate::config::parse_signature_prefix)
    /// refuses it.
    pub signature_prefix: Vec<u8>,
}

/// Converts KMS signatures into the canonical `r||s` form.
///
/// Stateless apart from its configuration; share freely across threads.
#[derive(Debug, Clone, Default)]
pub struct SignatureCodec {
    config: CodecConfig,
}

impl SignatureCodec {
    /// Create a codec with the given configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The configured signature prefix.
    pub fn prefix(&self) -> &[u8] {
        &self.config.signature_prefix
    }

    /// Decode a base64 signature (DER or already canonical).
    ///
    /// Trailing `=` padding is optional.
    pub fn decode_base64(&self, encoded: &str) -> Result<CanonicalSignature, CodecError> {
        if encoded.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        let bytes = BASE64_LENIENT.decode(encoded)?;
        self.decode(&bytes)
    }

    /// Decode raw signature bytes (DER or already canonical).
    pub fn decode(&self, bytes: &[u8]) -> Result<CanonicalSignature, CodecError> {
        self.decode_detailed(bytes).map(|decoded| decoded.signature)
    }

    /// Decode raw signature bytes and report how the input was interpreted.
    pub fn decode_detailed(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::EmptyPayload);
        }

        let body = self.strip_prefix(bytes);
        if body.len() < CANONICAL_SIGNATURE_LEN {
            return Err(CodecError::TooShort {
                actual: body.len(),
                minimum: CANONICAL_SIGNATURE_LEN,
            });
        }

        // A length that is a multiple of 64 means the signature is already in r||s form
        if body.len() % CANONICAL_SIGNATURE_LEN == 0 {
            let raw = <[u8; CANONICAL_SIGNATURE_LEN]>::try_from(body)
                .map_err(|_| CodecError::UnexpectedLength(body.len()))?;
            return Ok(Decoded {
                signature: CanonicalSignature::from_bytes(raw),
                form: SignatureForm::Canonical,
                s_normalized: false,
            });
        }

        let (r_raw, s_raw) = parse_der_integers(body)?;
        tracing::debug!(
            r = %hex::encode(r_raw),
            s = %hex::encode(s_raw),
            "Decoded DER signature integers"
        );

        let (r, r_padded) = to_scalar(r_raw, Component::R)?;
        let (s, s_padded) = to_scalar(s_raw, Component::S)?;

        // Compare against n/2 directly; the DER pad byte only tells whether bit 255 is set
        let (s, s_normalized) = normalize_s(&s)?;
        if s_normalized {
            tracing::debug!(s = %hex::encode(s), s_padded, "Normalized high s");
        }

        Ok(Decoded {
            signature: CanonicalSignature::from_components(&r, &s),
            form: SignatureForm::Der { r_padded, s_padded },
            s_normalized,
        })
    }

    /// `prefix || r || s`.
    pub fn encode(&self, signature: &CanonicalSignature) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.config.signature_prefix.len() + CANONICAL_SIGNATURE_LEN);
        out.extend_from_slice(&self.config.signature_prefix);
        out.extend_from_slice(signature.as_bytes());
        out
    }

    /// Hex of [`encode`](Self::encode).
    pub fn encode_hex(&self, signature: &CanonicalSignature) -> String {
        hex::encode(self.encode(signature))
    }

    /// Base64 of [`encode`](Self::encode).
    pub fn encode_base64(&self, signature: &CanonicalSignature) -> String {
        BASE64.encode(self.encode(signature))
    }

    /// Drop the configured prefix from a previously encoded signature.
    fn strip_prefix<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let prefix = &self.config.signature_prefix;
        if !prefix.is_empty()
            && bytes.len() == prefix.len() + CANONICAL_SIGNATURE_LEN
            && bytes.starts_with(prefix)
        {
            &bytes[prefix.len()..]
        } else {
            bytes
        }
    }
}

/// Parse `SEQUENCE { INTEGER r, INTEGER s }` and return the raw content
/// octets of both integers, sign pad included.
fn parse_der_integers(bytes: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let sequence = AnyRef::from_der(bytes)?;
    if sequence.tag() != Tag::Sequence {
        return Err(CodecError::InvalidSequence(format!(
            "expected SEQUENCE, found {}",
            sequence.tag()
        )));
    }

    let mut reader = SliceReader::new(sequence.value())?;
    let mut integers = Vec::with_capacity(2);
    while !reader.is_finished() {
        let element = AnyRef::decode(&mut reader)?;
        if element.tag() != Tag::Integer {
            return Err(CodecError::InvalidSequence(format!(
                "expected INTEGER, found {}",
                element.tag()
            )));
        }
        integers.push(element.value());
    }

    match integers.as_slice() {
        [r, s] => Ok((r, s)),
        other => {
            tracing::warn!(elements = other.len(), "Invalid ASN.1 sequence length");
            Err(CodecError::InvalidSequence(format!(
                "invalid ASN.1 sequence length: expected 2 integers, found {}",
                other.len()
            )))
        }
    }
}

/// Turn DER integer content octets into a 32-byte big-endian scalar.
///
/// Shorter values are left padded with zeros. A 33-byte value starting with
/// `0x00` loses exactly that byte. Returns whether the pad was stripped.
fn to_scalar(raw: &[u8], component: Component) -> Result<([u8; SCALAR_LEN], bool), CodecError> {
    if raw.is_empty() {
        return Err(CodecError::InvalidInteger {
            component,
            reason: "empty integer",
        });
    }

    let (magnitude, padded) = match raw {
        [0x00, rest @ ..] if raw.len() > SCALAR_LEN => (rest, true),
        _ => (raw, false),
    };

    if magnitude.len() > SCALAR_LEN {
        return Err(CodecError::InvalidInteger {
            component,
            reason: "wider than 32 bytes",
        });
    }

    let mut scalar = [0u8; SCALAR_LEN];
    scalar[SCALAR_LEN - magnitude.len()..].copy_from_slice(magnitude);

    if U256::from_big_endian(&scalar) >= SECP256K1_ORDER {
        return Err(CodecError::InvalidInteger {
            component,
            reason: "not below the curve order",
        });
    }

    Ok((scalar, padded))
}
