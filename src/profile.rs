//! The DAG-CBOR profile enforced by this crate.
//!
//! A byte sequence is **canonical** iff every item in it satisfies:
//!
//! - Definite lengths only (no indefinite-length encodings).
//! - Every argument (integer, length, count, tag number) uses the shortest of the
//!   inline / 1 / 2 / 4 / 8-byte forms.
//! - Integers: major 0/1 only, covering `-(2^64) ..= 2^64 - 1`.
//! - Text (major 3): valid UTF-8.
//! - Maps: keys are text strings, strictly increasing by canonical key order, no duplicates.
//! - Tags: only tag 42, wrapping a byte string `0x00 ++ cid_bytes`.
//! - Simple values: only `false`, `true`, `null` (major 7, ai 20..=22).
//! - Floats: only float64 (major 7, ai 27), finite.
//!
//! **Canonical map order** compares keys by
//! 1) UTF-8 byte length (shorter first), then
//! 2) lexicographic byte order.
//!
//! This is the same as comparing the encoded keys by (encoded length, encoded bytes), because
//! the canonical header length is a monotone function of the payload length.

use core::cmp::Ordering;

use crate::ErrorCode;

/// The only tag number allowed: a CID link.
pub const LINK_TAG: u64 = 42;

/// Multibase prefix for "raw binary": the first byte of every tag-42 payload.
pub const MULTIBASE_IDENTITY: u8 = 0x00;

/// Reject NaN and infinities.
#[inline]
pub fn validate_f64(value: f64) -> Result<(), ErrorCode> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ErrorCode::FloatNotFinite)
    }
}

/// Compare two UTF-8 text keys by DAG-CBOR canonical map ordering.
#[inline]
#[must_use]
pub fn cmp_text_keys_canonical(a: &str, b: &str) -> Ordering {
    cmp_key_bytes(a.as_bytes(), b.as_bytes())
}

/// Canonical ordering over raw key payloads: length first, then bytes.
#[inline]
#[must_use]
pub fn cmp_key_bytes(a: &[u8], b: &[u8]) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

/// Returns true iff `prev < curr` under canonical key ordering.
#[inline]
#[must_use]
pub fn is_strictly_increasing(prev: &[u8], curr: &[u8]) -> bool {
    cmp_key_bytes(prev, curr) == Ordering::Less
}

/// Number of argument bytes following the header for the shortest encoding of `value`.
///
/// Returns the additional-info value to use together with the extension width.
#[inline]
#[must_use]
pub const fn minimal_argument(value: u64) -> (u8, usize) {
    if value < 24 {
        // value < 24 fits in the low five bits
        #[allow(clippy::cast_possible_truncation)]
        let ai = value as u8;
        (ai, 0)
    } else if value <= 0xff {
        (24, 1)
    } else if value <= 0xffff {
        (25, 2)
    } else if value <= 0xffff_ffff {
        (26, 4)
    } else {
        (27, 8)
    }
}
