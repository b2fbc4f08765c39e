use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use crate::alloc_util::{alloc_failed, try_string_from_str, try_vec_from_slice, try_vec_with_capacity};
use crate::atjson::{bytes_marker, link_marker};
use crate::profile::{is_strictly_increasing, LINK_TAG, MULTIBASE_IDENTITY};
use crate::utf8;
use crate::wire::Cursor;
use crate::{CborError, Cid, DecodeLimits, ErrorCode, Mode, Value};

enum Item {
    Leaf(Value),
    ArrayStart { len: usize, off: usize },
    MapStart { len: usize, off: usize },
}

enum BuildFrame {
    Array {
        items: Vec<Value>,
        remaining: usize,
    },
    // `entries.last()` holds a key with a placeholder value while `awaiting_value` is set.
    Map {
        entries: Vec<(String, Value)>,
        remaining_pairs: usize,
        awaiting_value: bool,
    },
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    mode: Mode,
}

impl Parser<'_> {
    fn parse_item(&mut self) -> Result<Item, CborError> {
        let (major, ai, off) = self.cursor.read_header()?;
        match major {
            0 => Ok(Item::Leaf(Value::UnsignedInt(self.cursor.read_arg(ai, off)?))),
            1 => Ok(Item::Leaf(Value::NegativeInt(self.cursor.read_arg(ai, off)?))),
            2 => {
                let len = self.cursor.read_len(ai, off)?;
                let bytes = self.cursor.read_exact(len)?;
                let value = match self.mode {
                    Mode::Plain => Value::Bytes(try_vec_from_slice(bytes, off)?),
                    Mode::AtJson => bytes_marker(bytes),
                };
                Ok(Item::Leaf(value))
            }
            3 => {
                let len = self.cursor.read_len(ai, off)?;
                let bytes = self.cursor.read_exact(len)?;
                let s = utf8::validate(bytes, off)?;
                Ok(Item::Leaf(Value::Text(try_string_from_str(s, off)?)))
            }
            4 => {
                let len = self.cursor.read_len(ai, off)?;
                // every element takes at least one byte
                if len > self.cursor.remaining() {
                    return Err(CborError::new(ErrorCode::UnexpectedEof, off));
                }
                Ok(Item::ArrayStart { len, off })
            }
            5 => {
                let len = self.cursor.read_len(ai, off)?;
                if len.saturating_mul(2) > self.cursor.remaining() {
                    return Err(CborError::new(ErrorCode::UnexpectedEof, off));
                }
                Ok(Item::MapStart { len, off })
            }
            6 => self.parse_link(ai, off).map(Item::Leaf),
            _ => self.parse_simple(ai, off).map(Item::Leaf),
        }
    }

    fn parse_link(&mut self, ai: u8, off: usize) -> Result<Value, CborError> {
        let tag = self.cursor.read_arg(ai, off)?;
        if tag != LINK_TAG {
            return Err(CborError::new(ErrorCode::ForbiddenTag, off));
        }
        let (major, ai, payload_off) = self.cursor.read_header()?;
        if major != 2 {
            return Err(CborError::new(ErrorCode::MalformedLink, payload_off));
        }
        let len = self.cursor.read_len(ai, payload_off)?;
        let payload = self.cursor.read_exact(len)?;
        let Some((&MULTIBASE_IDENTITY, cid)) = payload.split_first() else {
            return Err(CborError::new(ErrorCode::MalformedLink, payload_off));
        };
        Ok(match self.mode {
            Mode::Plain => Value::Link(Cid::from_bytes(try_vec_from_slice(cid, payload_off)?)),
            Mode::AtJson => link_marker(cid),
        })
    }

    fn parse_simple(&mut self, ai: u8, off: usize) -> Result<Value, CborError> {
        match ai {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            27 => {
                let value = f64::from_bits(self.cursor.read_be_u64()?);
                if !value.is_finite() {
                    return Err(CborError::new(ErrorCode::ForbiddenFloatBits, off));
                }
                Ok(Value::Float(value))
            }
            28..=30 => Err(CborError::new(ErrorCode::ReservedAdditionalInfo, off)),
            // a lone "break"
            31 => Err(CborError::new(ErrorCode::IndefiniteLengthForbidden, off)),
            _ => Err(CborError::new(ErrorCode::UnsupportedSimpleValue, off)),
        }
    }

    fn parse_map_key(&mut self, prev: Option<&str>) -> Result<String, CborError> {
        let (major, ai, off) = self.cursor.read_header()?;
        if major != 3 {
            return Err(CborError::new(ErrorCode::MapKeyMustBeText, off));
        }
        let len = self.cursor.read_len(ai, off)?;
        let bytes = self.cursor.read_exact(len)?;
        let key = utf8::validate(bytes, off)?;
        if let Some(prev) = prev {
            if !is_strictly_increasing(prev.as_bytes(), bytes) {
                return Err(CborError::new(ErrorCode::NonCanonicalMapOrder, off));
            }
        }
        try_string_from_str(key, off)
    }
}

fn push_frame(stack: &mut Vec<BuildFrame>, frame: BuildFrame, off: usize) -> Result<(), CborError> {
    stack.try_reserve(1).map_err(|_| alloc_failed(off))?;
    stack.push(frame);
    Ok(())
}

/// Decode one item starting at `start`; offsets in errors are relative to `data`.
pub fn decode_from(
    data: &[u8],
    start: usize,
    mode: Mode,
    limits: DecodeLimits,
) -> Result<(Value, usize), CborError> {
    let mut p = Parser {
        cursor: Cursor::with_pos(data, start),
        mode,
    };
    let mut stack: Vec<BuildFrame> = Vec::new();
    let mut pending: Option<Value> = None;

    loop {
        if let Some(value) = pending.take() {
            let Some(frame) = stack.last_mut() else {
                return Ok((value, p.cursor.position()));
            };
            match frame {
                BuildFrame::Array { items, remaining } => {
                    items.push(value);
                    *remaining -= 1;
                    if *remaining == 0 {
                        let items = mem::take(items);
                        stack.pop();
                        pending = Some(Value::Array(items));
                    }
                }
                BuildFrame::Map {
                    entries,
                    remaining_pairs,
                    awaiting_value,
                } => {
                    if let Some(entry) = entries.last_mut() {
                        entry.1 = value;
                    }
                    *awaiting_value = false;
                    *remaining_pairs -= 1;
                    if *remaining_pairs == 0 {
                        let entries = mem::take(entries);
                        stack.pop();
                        pending = Some(Value::Map(entries));
                    }
                }
            }
            continue;
        }

        if let Some(BuildFrame::Map {
            entries,
            awaiting_value,
            ..
        }) = stack.last_mut()
        {
            if !*awaiting_value {
                let prev = entries.last().map(|(k, _)| k.as_str());
                let key = p.parse_map_key(prev)?;
                entries.push((key, Value::Null));
                *awaiting_value = true;
                continue;
            }
        }

        match p.parse_item()? {
            Item::Leaf(value) => pending = Some(value),
            Item::ArrayStart { len, off } => {
                if stack.len() >= limits.max_depth {
                    return Err(CborError::new(ErrorCode::DepthLimitExceeded, off));
                }
                if len == 0 {
                    pending = Some(Value::Array(Vec::new()));
                } else {
                    let items = try_vec_with_capacity(len, off)?;
                    push_frame(
                        &mut stack,
                        BuildFrame::Array {
                            items,
                            remaining: len,
                        },
                        off,
                    )?;
                }
            }
            Item::MapStart { len, off } => {
                if stack.len() >= limits.max_depth {
                    return Err(CborError::new(ErrorCode::DepthLimitExceeded, off));
                }
                if len == 0 {
                    pending = Some(Value::Map(Vec::new()));
                } else {
                    let entries = try_vec_with_capacity(len, off)?;
                    push_frame(
                        &mut stack,
                        BuildFrame::Map {
                            entries,
                            remaining_pairs: len,
                            awaiting_value: false,
                        },
                        off,
                    )?;
                }
            }
        }
    }
}

/// Decode the first canonical DAG-CBOR item in `bytes`.
///
/// Returns the value and the number of bytes it occupied. Trailing bytes are left for the
/// caller; see [`decode_exact`] to reject them, or [`crate::decode_stream`] to read them as
/// further items.
///
/// Nesting depth is bounded only by memory: traversal uses an explicit stack.
///
/// # Errors
///
/// Returns a [`CborError`] whose [`ErrorKind`](crate::ErrorKind) tells truncated input apart
/// from malformed or non-canonical input. Offsets point at the offending item's header, or
/// for truncation at the read that ran out of input.
pub fn decode(bytes: &[u8], mode: Mode) -> Result<(Value, usize), CborError> {
    decode_from(bytes, 0, mode, DecodeLimits::unlimited())
}

/// Like [`decode`], with caller-supplied resource limits.
///
/// # Errors
///
/// As [`decode`], plus `InputLimitExceeded` when `bytes` is longer than
/// `limits.max_input_bytes` and `DepthLimitExceeded` when containers nest deeper than
/// `limits.max_depth`.
pub fn decode_with_limits(
    bytes: &[u8],
    mode: Mode,
    limits: DecodeLimits,
) -> Result<(Value, usize), CborError> {
    if bytes.len() > limits.max_input_bytes {
        return Err(CborError::new(ErrorCode::InputLimitExceeded, 0));
    }
    decode_from(bytes, 0, mode, limits)
}

/// Decode exactly one item that must span all of `bytes`.
///
/// # Errors
///
/// As [`decode`], plus `TrailingBytes` (at the first unconsumed offset) when input remains.
pub fn decode_exact(bytes: &[u8], mode: Mode) -> Result<Value, CborError> {
    let (value, consumed) = decode(bytes, mode)?;
    if consumed != bytes.len() {
        return Err(CborError::new(ErrorCode::TrailingBytes, consumed));
    }
    Ok(value)
}
