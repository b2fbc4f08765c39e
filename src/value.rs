use alloc::string::String;
use alloc::vec::Vec;
use core::{fmt, mem, slice};

use crate::profile::cmp_text_keys_canonical;
use crate::{CborError, Cid, ErrorCode, Mode};

/// A DAG-CBOR data model value.
///
/// `Map` holds `(key, value)` pairs. Maps produced by the decoder are always in canonical key
/// order; maps built by hand may be in any order and are sorted by the encoder, which rejects
/// duplicate keys.
///
/// `Clone`, `PartialEq` and `Drop` walk nested containers with a heap stack, so values nested
/// far deeper than the native stack allows (for example decoded from hostile input) are safe to
/// copy, compare and release. `Debug` prints containers nested more than 128 levels deep as `..`.
///
/// Because `Value` implements `Drop`, payloads are taken out with the `as_*` accessors or
/// [`core::mem::take`] on a matched reference rather than by moving out of a pattern.
pub enum Value {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Unsigned integer `0 ..= 2^64 - 1` (major type 0).
    UnsignedInt(u64),
    /// Negative integer `-1 - n` for stored magnitude `n` (major type 1).
    NegativeInt(u64),
    /// Finite float64.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Text-keyed map.
    Map(Vec<(String, Value)>),
    /// A CID link (tag 42).
    Link(Cid),
}

impl Value {
    /// Construct an integer from the full DAG-CBOR range `-(2^64) ..= 2^64 - 1`.
    ///
    /// # Errors
    ///
    /// Returns `IntegerOutOfRange` for anything outside that range.
    pub fn integer_i128(v: i128) -> Result<Self, CborError> {
        let out_of_range = |_| CborError::new(ErrorCode::IntegerOutOfRange, 0);
        if v >= 0 {
            Ok(Self::UnsignedInt(u64::try_from(v).map_err(out_of_range)?))
        } else {
            let n = -1_i128 - v;
            Ok(Self::NegativeInt(u64::try_from(n).map_err(out_of_range)?))
        }
    }

    /// Build a map in canonical order from entries in any order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMapKey` if two entries share a key.
    pub fn map_sorted(mut entries: Vec<(String, Self)>) -> Result<Self, CborError> {
        entries.sort_by(|(a, _), (b, _)| cmp_text_keys_canonical(a, b));
        if entries.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(CborError::new(ErrorCode::DuplicateMapKey, 0));
        }
        Ok(Self::Map(entries))
    }

    /// Encode into canonical bytes.
    ///
    /// # Errors
    ///
    /// See [`crate::encode`].
    pub fn encode(&self, mode: Mode) -> Result<Vec<u8>, CborError> {
        crate::encode(self, mode)
    }

    /// Returns `true` iff this is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value, if this is an `UnsignedInt` or `NegativeInt`.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::UnsignedInt(n) => Some(i128::from(*n)),
            Self::NegativeInt(n) => Some(-1 - i128::from(*n)),
            _ => None,
        }
    }

    /// The float, if this is a `Float`.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The text, if this is a `Text`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The bytes, if this is a `Bytes`.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The CID, if this is a `Link`.
    #[must_use]
    pub const fn as_link(&self) -> Option<&Cid> {
        match self {
            Self::Link(cid) => Some(cid),
            _ => None,
        }
    }

    /// The items, if this is an `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a `Map`.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(String, Self)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up `key` if this is a `Map`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map()?
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

const DEBUG_MAX_DEPTH: usize = 128;

enum CloneFrame<'v> {
    Array(slice::Iter<'v, Value>, Vec<Value>),
    Map(slice::Iter<'v, (String, Value)>, Vec<(String, Value)>),
}

enum CloneStep<'v> {
    Leaf(Value),
    Open(CloneFrame<'v>),
}

impl<'v> CloneFrame<'v> {
    fn start(value: &'v Value) -> CloneStep<'v> {
        match value {
            Value::Array(items) => {
                CloneStep::Open(Self::Array(items.iter(), Vec::with_capacity(items.len())))
            }
            Value::Map(entries) => {
                CloneStep::Open(Self::Map(entries.iter(), Vec::with_capacity(entries.len())))
            }
            Value::Null => CloneStep::Leaf(Value::Null),
            Value::Bool(b) => CloneStep::Leaf(Value::Bool(*b)),
            Value::UnsignedInt(n) => CloneStep::Leaf(Value::UnsignedInt(*n)),
            Value::NegativeInt(n) => CloneStep::Leaf(Value::NegativeInt(*n)),
            Value::Float(f) => CloneStep::Leaf(Value::Float(*f)),
            Value::Text(s) => CloneStep::Leaf(Value::Text(s.clone())),
            Value::Bytes(b) => CloneStep::Leaf(Value::Bytes(b.clone())),
            Value::Link(cid) => CloneStep::Leaf(Value::Link(cid.clone())),
        }
    }

    // Map keys are copied as soon as their value is visited; the placeholder is overwritten by `push`.
    fn next_child(&mut self) -> Option<&'v Value> {
        match self {
            Self::Array(src, _) => src.next(),
            Self::Map(src, out) => src.next().map(|(k, v)| {
                out.push((k.clone(), Value::Null));
                v
            }),
        }
    }

    fn push(&mut self, value: Value) {
        match self {
            Self::Array(_, out) => out.push(value),
            Self::Map(_, out) => {
                if let Some(slot) = out.last_mut() {
                    slot.1 = value;
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Self::Array(_, out) => Value::Array(out),
            Self::Map(_, out) => Value::Map(out),
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let mut top = match CloneFrame::start(self) {
            CloneStep::Leaf(value) => return value,
            CloneStep::Open(frame) => frame,
        };
        let mut parents: Vec<CloneFrame<'_>> = Vec::new();
        loop {
            if let Some(child) = top.next_child() {
                match CloneFrame::start(child) {
                    CloneStep::Leaf(value) => top.push(value),
                    CloneStep::Open(frame) => parents.push(mem::replace(&mut top, frame)),
                }
                continue;
            }
            let built = top.finish();
            match parents.pop() {
                Some(parent) => {
                    top = parent;
                    top.push(built);
                }
                None => return built,
            }
        }
    }
}

impl PartialEq for Value {
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        let mut pending: Vec<(&Self, &Self)> = Vec::new();
        let mut pair = (self, other);
        loop {
            let same = match pair {
                (Self::Array(a), Self::Array(b)) => {
                    a.len() == b.len() && {
                        pending.extend(a.iter().zip(b));
                        true
                    }
                }
                (Self::Map(a), Self::Map(b)) => {
                    a.len() == b.len()
                        && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
                            pending.push((va, vb));
                            ka == kb
                        })
                }
                (Self::Null, Self::Null) => true,
                (Self::Bool(a), Self::Bool(b)) => a == b,
                (Self::UnsignedInt(a), Self::UnsignedInt(b))
                | (Self::NegativeInt(a), Self::NegativeInt(b)) => a == b,
                (Self::Float(a), Self::Float(b)) => a == b,
                (Self::Text(a), Self::Text(b)) => a == b,
                (Self::Bytes(a), Self::Bytes(b)) => a == b,
                (Self::Link(a), Self::Link(b)) => a == b,
                _ => false,
            };
            if !same {
                return false;
            }
            match pending.pop() {
                Some(next) => pair = next,
                None => return true,
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Nested { value: self, depth: 0 }, f)
    }
}

struct Nested<'a> {
    value: &'a Value,
    depth: usize,
}

impl fmt::Debug for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.depth + 1;
        match self.value {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::UnsignedInt(n) => f.debug_tuple("UnsignedInt").field(n).finish(),
            Value::NegativeInt(n) => f.debug_tuple("NegativeInt").field(n).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Value::Link(cid) => f.debug_tuple("Link").field(cid).finish(),
            Value::Array(_) if self.depth >= DEBUG_MAX_DEPTH => f.write_str("Array(..)"),
            Value::Map(_) if self.depth >= DEBUG_MAX_DEPTH => f.write_str("Map(..)"),
            Value::Array(items) => {
                let items = items.iter().map(|value| Nested { value, depth });
                f.debug_tuple("Array").field(&DebugList(items)).finish()
            }
            Value::Map(entries) => {
                let entries = entries.iter().map(|(k, value)| (k, Nested { value, depth }));
                f.debug_tuple("Map").field(&DebugList(entries)).finish()
            }
        }
    }
}

struct DebugList<I>(I);

impl<I, T> fmt::Debug for DebugList<I>
where
    I: Iterator<Item = T> + Clone,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        let mut pending: Vec<Self> = match self {
            Self::Array(items) if !items.is_empty() => mem::take(items),
            Self::Map(entries) if !entries.is_empty() => {
                mem::take(entries).into_iter().map(|(_, v)| v).collect()
            }
            _ => return,
        };
        // Each popped value has its children moved out before it drops, so it drops shallowly.
        while let Some(mut value) = pending.pop() {
            match &mut value {
                Self::Array(items) => pending.append(items),
                Self::Map(entries) => pending.extend(mem::take(entries).into_iter().map(|(_, v)| v)),
                _ => {}
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UnsignedInt(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        if v >= 0 {
            Self::UnsignedInt(v.unsigned_abs())
        } else {
            Self::NegativeInt(v.unsigned_abs() - 1)
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(String::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Cid> for Value {
    fn from(v: Cid) -> Self {
        Self::Link(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Array(v)
    }
}
