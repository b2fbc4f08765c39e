//! Multibase base32 (RFC 4648 alphabet, lowercase, no padding) for CID text forms.

use alloc::string::String;
use alloc::vec::Vec;

use crate::ErrorCode;

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Multibase prefix of lowercase unpadded base32.
pub const BASE32_PREFIX: char = 'b';

/// Append the base32 encoding of `data` to `out`.
pub fn encode_base32(data: &[u8], out: &mut String) {
    let mut buffer: u16 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = usize::from((buffer >> bits) & 0x1f);
            out.push(char::from(BASE32_ALPHABET[index]));
        }
        // keep only the bits that have not been emitted yet
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        let index = usize::from((buffer << (5 - bits)) & 0x1f);
        out.push(char::from(BASE32_ALPHABET[index]));
    }
}

/// `"b"` followed by the base32 encoding of `data`.
#[must_use]
pub fn to_base32_multibase(data: &[u8]) -> String {
    let mut out = String::with_capacity(1 + (data.len() * 8 + 4) / 5);
    out.push(BASE32_PREFIX);
    encode_base32(data, &mut out);
    out
}

const fn symbol_value(c: u8) -> Option<u8> {
    match c {
        b'a'..=b'z' => Some(c - b'a'),
        b'A'..=b'Z' => Some(c - b'A'),
        b'2'..=b'7' => Some(c - b'2' + 26),
        _ => None,
    }
}

/// Decode unpadded base32, case-insensitively.
///
/// Lengths that cannot come from the encoder and non-zero trailing bits are rejected, so every
/// byte string has exactly one accepted (lowercase) text form.
pub fn decode_base32(text: &str) -> Result<Vec<u8>, ErrorCode> {
    let symbols = text.as_bytes();
    if matches!(symbols.len() % 8, 1 | 3 | 6) {
        return Err(ErrorCode::InvalidBase32);
    }

    let mut out = Vec::with_capacity(symbols.len() * 5 / 8);
    let mut buffer: u16 = 0;
    let mut bits: u32 = 0;

    for &c in symbols {
        let v = symbol_value(c).ok_or(ErrorCode::InvalidBase32)?;
        buffer = (buffer << 5) | u16::from(v);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            // the low byte after the shift is exactly the next output byte
            #[allow(clippy::cast_possible_truncation)]
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    if buffer != 0 {
        return Err(ErrorCode::InvalidBase32);
    }
    Ok(out)
}

/// Decode a multibase string; only the base32 (`b`) prefix is supported.
pub fn from_base32_multibase(text: &str) -> Result<Vec<u8>, ErrorCode> {
    let rest = text
        .strip_prefix(BASE32_PREFIX)
        .ok_or(ErrorCode::UnsupportedMultibase)?;
    decode_base32(rest)
}
