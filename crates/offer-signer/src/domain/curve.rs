//! # secp256k1 Scalar Arithmetic
//!
//! Curve-order constants and low-S normalization (BIP-62 / EIP-2).
//!
//! Every valid signature `(r, s)` has an equivalent twin `(r, n - s)`. Chains
//! accept only the smaller `s` so that a third party cannot produce a second
//! valid encoding of the same signature.

use super::errors::{CodecError, Component};
use primitive_types::U256;

/// Width in bytes of an `r` or `s` scalar.
pub const SCALAR_LEN: usize = 32;

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
pub const SECP256K1_ORDER: U256 = U256([
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
]);

/// Half of the secp256k1 curve order, `n >> 1`.
pub const SECP256K1_HALF_ORDER: U256 = U256([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Check if `s` lies in the upper half of the curve order (`s > n/2`).
pub fn is_high_s(s: &[u8; SCALAR_LEN]) -> bool {
    U256::from_big_endian(s) > SECP256K1_HALF_ORDER
}

/// Return the low-S form of `s` and whether it had to be flipped.
///
/// Fails with [`CodecError::InvalidInteger`] if `s >= n`.
pub fn normalize_s(s: &[u8; SCALAR_LEN]) -> Result<([u8; SCALAR_LEN], bool), CodecError> {
    let value = U256::from_big_endian(s);
    if value <= SECP256K1_HALF_ORDER {
        return Ok((*s, false));
    }
    if value >= SECP256K1_ORDER {
        return Err(CodecError::InvalidInteger {
            component: Component::S,
            reason: "not below the curve order",
        });
    }

    let mut out = [0u8; SCALAR_LEN];
    (SECP256K1_ORDER - value).to_big_endian(&mut out);
    Ok((out, true))
}

/// Hex flavour of [`normalize_s`].
///
/// Parses `s_hex` as an unsigned big-endian integer, replaces it with `n - s`
/// when it is above `n/2`, and re-encodes it as lowercase hex left-padded with
/// `0` to an even number of digits (not to the full 64).
pub fn normalize_s_hex(s_hex: &str) -> Result<String, CodecError> {
    if s_hex.is_empty() {
        return Err(CodecError::InvalidHex("empty scalar".to_string()));
    }
    if !s_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::InvalidHex(format!("non-hex digits in {s_hex:?}")));
    }

    let mut s = U256::from_str_radix(s_hex, 16)
        .map_err(|_| CodecError::InvalidHex(format!("{s_hex:?} does not fit in 256 bits")))?;

    if s > SECP256K1_HALF_ORDER {
        if s >= SECP256K1_ORDER {
            return Err(CodecError::InvalidHex(format!(
                "{s_hex:?} is not below the curve order"
            )));
        }
        s = SECP256K1_ORDER - s;
    }

    let mut normalized = format!("{s:x}");
    if normalized.len() % 2 != 0 {
        normalized.insert(0, '0');
    }
    Ok(normalized)
}
