//! AtJSON transcoding: byte strings and links as JSON-compatible marker objects.
//!
//! In [`Mode::AtJson`] the decoder produces `{"$bytes": <base64>}` wherever it would produce
//! [`Value::Bytes`], and `{"$link": <multibase base32>}` wherever it would produce
//! [`Value::Link`]. The encoder accepts those marker maps back and refuses raw `Bytes`/`Link`.
//!
//! This is not a lossless mapping: a real map whose only key is `"$bytes"` or `"$link"` cannot
//! be told apart from a marker. Use [`Mode::Plain`] when byte-exact round trips matter.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::multibase;
use crate::{CborError, ErrorCode, Value};

/// Key of the byte string marker object.
pub const BYTES_MARKER: &str = "$bytes";

/// Key of the link marker object.
pub const LINK_MARKER: &str = "$link";

// Padding is never written but tolerated on input; trailing bits are not checked.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Transcoding policy for [`crate::decode`] and [`crate::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// The plain DAG-CBOR data model. Round trips are byte-exact.
    #[default]
    Plain,
    /// Byte strings and links travel as `$bytes` / `$link` marker maps.
    AtJson,
}

pub fn bytes_marker(bytes: &[u8]) -> Value {
    Value::Map(vec![(
        String::from(BYTES_MARKER),
        Value::Text(BASE64.encode(bytes)),
    )])
}

pub fn link_marker(cid_bytes: &[u8]) -> Value {
    Value::Map(vec![(
        String::from(LINK_MARKER),
        Value::Text(multibase::to_base32_multibase(cid_bytes)),
    )])
}

/// A recognised marker map, with its decoded payload.
pub enum Marker {
    Bytes(Vec<u8>),
    Link(Vec<u8>),
}

/// Recognise a `$bytes` / `$link` marker map.
///
/// Only single-entry maps whose key is exactly one of the marker names qualify; every other
/// map returns `Ok(None)` and is encoded as an ordinary map.
pub fn parse_marker(entries: &[(String, Value)], off: usize) -> Result<Option<Marker>, CborError> {
    let [(key, value)] = entries else {
        return Ok(None);
    };
    let is_bytes = key == BYTES_MARKER;
    if !is_bytes && key != LINK_MARKER {
        return Ok(None);
    }
    let Value::Text(text) = value else {
        return Err(CborError::new(ErrorCode::MarkerValueMustBeText, off));
    };
    if is_bytes {
        let bytes = BASE64
            .decode(text)
            .map_err(|_| CborError::new(ErrorCode::InvalidBase64, off))?;
        Ok(Some(Marker::Bytes(bytes)))
    } else {
        let cid =
            multibase::from_base32_multibase(text).map_err(|code| CborError::new(code, off))?;
        Ok(Some(Marker::Link(cid)))
    }
}
