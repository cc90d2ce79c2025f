//! # secp256k1 Public Keys
//!
//! KMS services hand out public keys as DER `SubjectPublicKeyInfo`; the chain
//! identifies accounts by the 33-byte compressed SEC1 point.

use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::pkcs8::DecodePublicKey;
use k256::PublicKey;

use super::errors::PublicKeyError;

/// Length of a compressed SEC1 point.
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed SEC1 point.
pub const UNCOMPRESSED_LEN: usize = 65;

/// Compressed secp256k1 public key: `<0x02|0x03> || x`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedPublicKey([u8; COMPRESSED_LEN]);

impl CompressedPublicKey {
    /// Create from a SEC1 point, compressing it if needed.
    ///
    /// Accepts `0x02|0x03 || x` (33 bytes) or `0x04 || x || y` (65 bytes).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, PublicKeyError> {
        match bytes {
            [] => Err(PublicKeyError::Empty),
            [0x02 | 0x03, ..] if bytes.len() == COMPRESSED_LEN => Self::parse(bytes),
            [0x04, ..] if bytes.len() == UNCOMPRESSED_LEN => Self::parse(bytes),
            [tag, ..] => Err(PublicKeyError::WrongFormat {
                len: bytes.len(),
                tag: *tag,
            }),
        }
    }

    /// Create from DER `SubjectPublicKeyInfo`, as returned by KMS `GetPublicKey`.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, PublicKeyError> {
        let key =
            PublicKey::from_public_key_der(der).map_err(|e| PublicKeyError::Spki(e.to_string()))?;
        Ok(Self::from_public_key(&key))
    }

    /// Create from a PEM `-----BEGIN PUBLIC KEY-----` block.
    pub fn from_spki_pem(pem: &str) -> Result<Self, PublicKeyError> {
        let key =
            PublicKey::from_public_key_pem(pem).map_err(|e| PublicKeyError::Spki(e.to_string()))?;
        Ok(Self::from_public_key(&key))
    }

    /// Raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_LEN] {
        &self.0
    }

    /// Lowercase hex of the compressed point.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The `k256` public key, for signature verification.
    pub fn to_public_key(&self) -> Result<PublicKey, PublicKeyError> {
        PublicKey::from_sec1_bytes(&self.0).map_err(|_| PublicKeyError::InvalidPoint)
    }

    fn parse(bytes: &[u8]) -> Result<Self, PublicKeyError> {
        let key = PublicKey::from_sec1_bytes(bytes).map_err(|_| PublicKeyError::InvalidPoint)?;
        Ok(Self::from_public_key(&key))
    }

    fn from_public_key(key: &PublicKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut bytes = [0u8; COMPRESSED_LEN];
        // A compressed encoding of a non-identity point is always 33 bytes
        bytes.copy_from_slice(point.as_bytes());
        Self(bytes)
    }
}

impl fmt::Display for CompressedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CompressedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedPublicKey({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::pkcs8::{EncodePublicKey, LineEnding};

    fn keypair() -> (SigningKey, PublicKey) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let public_key = PublicKey::from(signing_key.verifying_key());
        (signing_key, public_key)
    }

    #[test]
    fn test_uncompressed_is_compressed() {
        let (_, public_key) = keypair();
        let uncompressed = public_key.to_encoded_point(false);
        let compressed = public_key.to_encoded_point(true);

        let key = CompressedPublicKey::from_sec1_bytes(uncompressed.as_bytes()).unwrap();
        assert_eq!(key.as_bytes().as_slice(), compressed.as_bytes());

        // y parity decides the tag
        let y_is_odd = uncompressed.as_bytes()[64] & 1 == 1;
        assert_eq!(key.as_bytes()[0], if y_is_odd { 0x03 } else { 0x02 });
    }

    #[test]
    fn test_compressed_passes_through() {
        let (_, public_key) = keypair();
        let compressed = public_key.to_encoded_point(true);
        let key = CompressedPublicKey::from_sec1_bytes(compressed.as_bytes()).unwrap();
        assert_eq!(key.as_bytes().as_slice(), compressed.as_bytes());
        assert_eq!(key.to_public_key().unwrap(), public_key);
    }

    #[test]
    fn test_spki_der_and_pem() {
        let (_, public_key) = keypair();
        let expected = public_key.to_encoded_point(true);

        let der = public_key.to_public_key_der().unwrap();
        let from_der = CompressedPublicKey::from_spki_der(der.as_bytes()).unwrap();
        assert_eq!(from_der.as_bytes().as_slice(), expected.as_bytes());

        let pem = public_key.to_public_key_pem(LineEnding::LF).unwrap();
        let from_pem = CompressedPublicKey::from_spki_pem(&pem).unwrap();
        assert_eq!(from_pem, from_der);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            CompressedPublicKey::from_sec1_bytes(&[]),
            Err(PublicKeyError::Empty)
        );
        assert_eq!(
            CompressedPublicKey::from_sec1_bytes(&[0x05; 33]),
            Err(PublicKeyError::WrongFormat { len: 33, tag: 0x05 })
        );
        assert_eq!(
            CompressedPublicKey::from_sec1_bytes(&[0x04; 33]),
            Err(PublicKeyError::WrongFormat { len: 33, tag: 0x04 })
        );
        // x above the field prime
        let mut off_curve = [0xFFu8; 33];
        off_curve[0] = 0x02;
        assert_eq!(
            CompressedPublicKey::from_sec1_bytes(&off_curve),
            Err(PublicKeyError::InvalidPoint)
        );
        assert!(matches!(
            CompressedPublicKey::from_spki_der(&[0x30, 0x00]),
            Err(PublicKeyError::Spki(_))
        ));
    }
}
