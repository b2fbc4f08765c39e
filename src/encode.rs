use alloc::string::String;
use alloc::vec::Vec;
use core::slice;

use crate::alloc_util::{try_reserve, try_vec_with_capacity};
use crate::atjson::{parse_marker, Marker};
use crate::profile::{
    cmp_key_bytes, cmp_text_keys_canonical, validate_f64, LINK_TAG, MULTIBASE_IDENTITY,
};
use crate::{CborError, Cid, ErrorCode, Mode, Value};

trait Sink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CborError>;

    fn write_u8(&mut self, byte: u8) -> Result<(), CborError> {
        self.write(&[byte])
    }

    fn position(&self) -> usize;
}

struct VecSink {
    buf: Vec<u8>,
}

impl VecSink {
    const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::new();
        let _ = buf.try_reserve(capacity);
        Self { buf }
    }

    fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    fn reserve(&mut self, additional: usize) -> Result<(), CborError> {
        let available = self.buf.capacity().saturating_sub(self.buf.len());
        if additional <= available {
            return Ok(());
        }
        let offset = self.buf.len();
        try_reserve(&mut self.buf, additional, offset)
    }

    fn rollback<T>(&mut self, start: usize, res: Result<T, CborError>) -> Result<T, CborError> {
        if res.is_err() {
            self.buf.truncate(start);
        }
        res
    }
}

impl Sink for VecSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CborError> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_u8(&mut self, byte: u8) -> Result<(), CborError> {
        if self.buf.len() == self.buf.capacity() {
            self.reserve(1)?;
        }
        self.buf.push(byte);
        Ok(())
    }

    fn position(&self) -> usize {
        self.buf.len()
    }
}

fn err_at<S: Sink>(sink: &S, code: ErrorCode) -> CborError {
    CborError::new(code, sink.position())
}

fn encode_i128<S: Sink>(sink: &mut S, v: i128) -> Result<(), CborError> {
    let out_of_range = |_| err_at(sink, ErrorCode::IntegerOutOfRange);
    if v >= 0 {
        let u = u64::try_from(v).map_err(out_of_range)?;
        encode_major_uint(sink, 0, u)
    } else {
        let n = u64::try_from(-1_i128 - v).map_err(out_of_range)?;
        encode_major_uint(sink, 1, n)
    }
}

fn encode_bytes<S: Sink>(sink: &mut S, bytes: &[u8]) -> Result<(), CborError> {
    encode_major_len(sink, 2, bytes.len())?;
    sink.write(bytes)
}

fn encode_text<S: Sink>(sink: &mut S, s: &str) -> Result<(), CborError> {
    // `str` guarantees valid UTF-8.
    let b = s.as_bytes();
    encode_major_len(sink, 3, b.len())?;
    sink.write(b)
}

fn encode_float64<S: Sink>(sink: &mut S, value: f64) -> Result<(), CborError> {
    validate_f64(value).map_err(|code| err_at(sink, code))?;
    let mut buf = [0u8; 9];
    buf[0] = 0xfb;
    buf[1..9].copy_from_slice(&value.to_bits().to_be_bytes());
    sink.write(&buf)
}

fn encode_link<S: Sink>(sink: &mut S, cid: &[u8]) -> Result<(), CborError> {
    let payload_len = cid
        .len()
        .checked_add(1)
        .ok_or_else(|| err_at(sink, ErrorCode::LengthTooLarge))?;
    encode_major_uint(sink, 6, LINK_TAG)?;
    encode_major_len(sink, 2, payload_len)?;
    sink.write_u8(MULTIBASE_IDENTITY)?;
    sink.write(cid)
}

fn encode_major_len<S: Sink>(sink: &mut S, major: u8, len: usize) -> Result<(), CborError> {
    let len_u64 = u64::try_from(len).map_err(|_| err_at(sink, ErrorCode::LengthTooLarge))?;
    encode_major_uint(sink, major, len_u64)
}

fn encode_major_uint<S: Sink>(sink: &mut S, major: u8, value: u64) -> Result<(), CborError> {
    debug_assert!(major <= 7);
    if let Ok(v8) = u8::try_from(value) {
        if v8 < 24 {
            return sink.write_u8((major << 5) | v8);
        }
        sink.write_u8((major << 5) | 24)?;
        return sink.write_u8(v8);
    }
    if let Ok(v16) = u16::try_from(value) {
        sink.write_u8((major << 5) | 25)?;
        return sink.write(&v16.to_be_bytes());
    }
    if let Ok(v32) = u32::try_from(value) {
        sink.write_u8((major << 5) | 26)?;
        return sink.write(&v32.to_be_bytes());
    }
    sink.write_u8((major << 5) | 27)?;
    sink.write(&value.to_be_bytes())
}

/// Pending work for the value encoder: the rest of a container still to be written.
enum Frame<'v> {
    Array(slice::Iter<'v, Value>),
    Map {
        entries: &'v [(String, Value)],
        order: Vec<usize>,
        next: usize,
    },
}

/// Entry indices of `entries` in canonical key order.
fn canonical_order(entries: &[(String, Value)], off: usize) -> Result<Vec<usize>, CborError> {
    let mut order = try_vec_with_capacity(entries.len(), off)?;
    order.extend(0..entries.len());
    order.sort_unstable_by(|&a, &b| cmp_text_keys_canonical(&entries[a].0, &entries[b].0));
    if order
        .windows(2)
        .any(|w| entries[w[0]].0 == entries[w[1]].0)
    {
        return Err(CborError::new(ErrorCode::DuplicateMapKey, off));
    }
    Ok(order)
}

/// Write the head of `value`. Containers return the frame that will write their children.
fn encode_item<'v, S: Sink>(
    sink: &mut S,
    value: &'v Value,
    mode: Mode,
) -> Result<Option<Frame<'v>>, CborError> {
    match value {
        Value::Null => sink.write_u8(0xf6)?,
        Value::Bool(b) => sink.write_u8(if *b { 0xf5 } else { 0xf4 })?,
        Value::UnsignedInt(n) => encode_major_uint(sink, 0, *n)?,
        Value::NegativeInt(n) => encode_major_uint(sink, 1, *n)?,
        Value::Float(f) => encode_float64(sink, *f)?,
        Value::Text(s) => encode_text(sink, s)?,
        Value::Bytes(b) => match mode {
            Mode::Plain => encode_bytes(sink, b)?,
            Mode::AtJson => return Err(err_at(sink, ErrorCode::UnexpectedBytesInAtJson)),
        },
        Value::Link(cid) => match mode {
            Mode::Plain => encode_link(sink, cid.as_bytes())?,
            Mode::AtJson => return Err(err_at(sink, ErrorCode::UnexpectedLinkInAtJson)),
        },
        Value::Array(items) => {
            encode_major_len(sink, 4, items.len())?;
            return Ok(Some(Frame::Array(items.iter())));
        }
        Value::Map(entries) => {
            if mode == Mode::AtJson {
                match parse_marker(entries, sink.position())? {
                    Some(Marker::Bytes(bytes)) => {
                        encode_bytes(sink, &bytes)?;
                        return Ok(None);
                    }
                    Some(Marker::Link(cid)) => {
                        encode_link(sink, &cid)?;
                        return Ok(None);
                    }
                    None => {}
                }
            }
            let order = canonical_order(entries, sink.position())?;
            encode_major_len(sink, 5, entries.len())?;
            return Ok(Some(Frame::Map {
                entries,
                order,
                next: 0,
            }));
        }
    }
    Ok(None)
}

fn encode_value_into<S: Sink>(sink: &mut S, root: &Value, mode: Mode) -> Result<(), CborError> {
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut pending = Some(root);

    loop {
        if let Some(value) = pending.take() {
            if let Some(frame) = encode_item(sink, value, mode)? {
                stack
                    .try_reserve(1)
                    .map_err(|_| err_at(sink, ErrorCode::AllocationFailed))?;
                stack.push(frame);
            }
        }

        let Some(frame) = stack.last_mut() else {
            return Ok(());
        };
        match frame {
            Frame::Array(items) => match items.next() {
                Some(item) => pending = Some(item),
                None => {
                    stack.pop();
                }
            },
            Frame::Map {
                entries,
                order,
                next,
            } => match order.get(*next) {
                Some(&idx) => {
                    *next += 1;
                    let entries = *entries;
                    let (key, item) = &entries[idx];
                    encode_text(sink, key)?;
                    pending = Some(item);
                }
                None => {
                    stack.pop();
                }
            },
        }
    }
}

/// Encode `value` as canonical DAG-CBOR.
///
/// Map entries are written in canonical key order whatever their order in the `Value`.
/// Traversal uses an explicit stack, so arbitrarily deep values do not exhaust the call stack.
///
/// In [`Mode::AtJson`], single-entry `$bytes` / `$link` marker maps are written as byte strings
/// and links, and raw [`Value::Bytes`] / [`Value::Link`] are rejected.
///
/// # Errors
///
/// - `FloatNotFinite` for NaN or infinite floats.
/// - `DuplicateMapKey` if a map contains the same key twice.
/// - `UnexpectedBytesInAtJson` / `UnexpectedLinkInAtJson` for raw bytes or links in AtJSON mode.
/// - `MarkerValueMustBeText`, `InvalidBase64`, `InvalidBase32` or `UnsupportedMultibase` for
///   malformed marker maps in AtJSON mode.
///
/// Error offsets are the number of bytes written before the failure.
pub fn encode(value: &Value, mode: Mode) -> Result<Vec<u8>, CborError> {
    let mut enc = Encoder::new();
    enc.value(value, mode)?;
    Ok(enc.into_vec())
}

/// Streaming encoder that writes canonical DAG-CBOR directly into a `Vec<u8>`.
///
/// Every method either appends one complete item or fails and leaves the buffer as it was.
pub struct Encoder {
    sink: VecSink,
    // Complete items written at the current builder level.
    items: usize,
}

impl Encoder {
    /// Create a new canonical encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sink: VecSink::new(),
            items: 0,
        }
    }

    /// Create a canonical encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sink: VecSink::with_capacity(capacity),
            items: 0,
        }
    }

    /// Return the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sink.buf.len()
    }

    /// Returns `true` if no bytes have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sink.buf.is_empty()
    }

    /// Consume and return the encoded bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.sink.into_vec()
    }

    /// Borrow the bytes emitted so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.sink.buf
    }

    /// Encode null.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn null(&mut self) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = self.sink.write_u8(0xf6);
        self.finish_item(start, res)
    }

    /// Encode a boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn bool(&mut self, v: bool) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = self.sink.write_u8(if v { 0xf5 } else { 0xf4 });
        self.finish_item(start, res)
    }

    /// Encode a non-negative integer (major type 0).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn unsigned(&mut self, v: u64) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_major_uint(&mut self.sink, 0, v);
        self.finish_item(start, res)
    }

    /// Encode the negative integer `-1 - magnitude` (major type 1).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn negative(&mut self, magnitude: u64) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_major_uint(&mut self.sink, 1, magnitude);
        self.finish_item(start, res)
    }

    /// Encode a signed 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn int(&mut self, v: i64) -> Result<(), CborError> {
        self.int_i128(i128::from(v))
    }

    /// Encode an integer from the full range `-(2^64) ..= 2^64 - 1`.
    ///
    /// # Errors
    ///
    /// Returns `IntegerOutOfRange` outside that range, or an error if writing fails.
    pub fn int_i128(&mut self, v: i128) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_i128(&mut self.sink, v);
        self.finish_item(start, res)
    }

    /// Encode a float64.
    ///
    /// # Errors
    ///
    /// Returns `FloatNotFinite` for NaN and infinities, or an error if writing fails.
    pub fn float(&mut self, v: f64) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_float64(&mut self.sink, v);
        self.finish_item(start, res)
    }

    /// Encode a text string.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn text(&mut self, s: &str) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_text(&mut self.sink, s);
        self.finish_item(start, res)
    }

    /// Encode a byte string.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn bytes(&mut self, b: &[u8]) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_bytes(&mut self.sink, b);
        self.finish_item(start, res)
    }

    /// Encode a CID link (tag 42).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn link(&mut self, cid: &Cid) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_link(&mut self.sink, cid.as_bytes());
        self.finish_item(start, res)
    }

    /// Encode a whole [`Value`]. See [`encode`].
    ///
    /// # Errors
    ///
    /// Same as [`encode`]; nothing is written on failure.
    pub fn value(&mut self, value: &Value, mode: Mode) -> Result<(), CborError> {
        let start = self.sink.buf.len();
        let res = encode_value_into(&mut self.sink, value, mode);
        self.finish_item(start, res)
    }

    /// Encode a definite-length array and fill it via the provided builder.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or if the builder emits a different number of items.
    pub fn array<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut ArrayEncoder<'_>) -> Result<(), CborError>,
    {
        let start = self.sink.buf.len();
        if let Err(err) = encode_major_len(&mut self.sink, 4, len) {
            self.sink.buf.truncate(start);
            return Err(err);
        }
        if let Err(err) = self.reserve_min_items(len) {
            self.sink.buf.truncate(start);
            return Err(err);
        }
        let outer = self.items;
        let mut a = ArrayEncoder {
            enc: self,
            remaining: len,
        };
        let res = f(&mut a).and_then(|()| {
            if a.remaining == 0 {
                Ok(())
            } else {
                Err(CborError::new(ErrorCode::ArrayLenMismatch, a.enc.sink.position()))
            }
        });
        self.items = outer;
        self.finish_item(start, res)
    }

    /// Encode a definite-length map and fill it via the provided builder.
    ///
    /// Entries must be supplied in canonical key order.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails, if keys are out of order or duplicated, or if the
    /// builder emits a different number of entries.
    pub fn map<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut MapEncoder<'_>) -> Result<(), CborError>,
    {
        let start = self.sink.buf.len();
        if let Err(err) = encode_major_len(&mut self.sink, 5, len) {
            self.sink.buf.truncate(start);
            return Err(err);
        }
        let reserved = len
            .checked_mul(2)
            .ok_or_else(|| CborError::new(ErrorCode::LengthTooLarge, start))
            .and_then(|items| self.reserve_min_items(items));
        if let Err(err) = reserved {
            self.sink.buf.truncate(start);
            return Err(err);
        }
        let outer = self.items;
        let mut m = MapEncoder {
            enc: self,
            remaining: len,
            prev_key_range: None,
        };
        let res = f(&mut m).and_then(|()| {
            if m.remaining == 0 {
                Ok(())
            } else {
                Err(CborError::new(ErrorCode::MapLenMismatch, m.enc.sink.position()))
            }
        });
        self.items = outer;
        self.finish_item(start, res)
    }

    fn finish_item(&mut self, start: usize, res: Result<(), CborError>) -> Result<(), CborError> {
        let res = self.sink.rollback(start, res);
        if res.is_ok() {
            self.items += 1;
        }
        res
    }

    // Every item takes at least one byte.
    fn reserve_min_items(&mut self, items: usize) -> Result<(), CborError> {
        if items == 0 {
            return Ok(());
        }
        self.sink.reserve(items)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for writing array elements into a canonical DAG-CBOR stream.
pub struct ArrayEncoder<'a> {
    enc: &'a mut Encoder,
    remaining: usize,
}

impl ArrayEncoder<'_> {
    fn consume_one(&mut self) -> Result<(), CborError> {
        if self.remaining == 0 {
            return Err(CborError::new(
                ErrorCode::ArrayLenMismatch,
                self.enc.sink.position(),
            ));
        }
        self.remaining -= 1;
        Ok(())
    }

    /// Encode null.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn null(&mut self) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.null()
    }

    /// Encode a boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn bool(&mut self, v: bool) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.bool(v)
    }

    /// Encode a non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn unsigned(&mut self, v: u64) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.unsigned(v)
    }

    /// Encode the negative integer `-1 - magnitude`.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn negative(&mut self, magnitude: u64) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.negative(magnitude)
    }

    /// Encode a signed 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn int(&mut self, v: i64) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.int(v)
    }

    /// Encode an integer from the full DAG-CBOR range.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn int_i128(&mut self, v: i128) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.int_i128(v)
    }

    /// Encode a float64.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn float(&mut self, v: f64) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.float(v)
    }

    /// Encode a text string.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn text(&mut self, s: &str) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.text(s)
    }

    /// Encode a byte string.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn bytes(&mut self, b: &[u8]) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.bytes(b)
    }

    /// Encode a CID link.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn link(&mut self, cid: &Cid) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.link(cid)
    }

    /// Encode a whole [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn value(&mut self, value: &Value, mode: Mode) -> Result<(), CborError> {
        self.consume_one()?;
        self.enc.value(value, mode)
    }

    /// Encode a nested array.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn array<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut ArrayEncoder<'_>) -> Result<(), CborError>,
    {
        self.consume_one()?;
        self.enc.array(len, f)
    }

    /// Encode a nested map.
    ///
    /// # Errors
    ///
    /// Returns an error if the array length is exceeded or if encoding fails.
    pub fn map<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut MapEncoder<'_>) -> Result<(), CborError>,
    {
        self.consume_one()?;
        self.enc.map(len, f)
    }
}

/// Builder for writing map entries into a canonical DAG-CBOR stream.
pub struct MapEncoder<'a> {
    enc: &'a mut Encoder,
    remaining: usize,
    prev_key_range: Option<(usize, usize)>,
}

impl MapEncoder<'_> {
    fn fail_entry<T>(&mut self, entry_start: usize, err: CborError) -> Result<T, CborError> {
        self.enc.sink.buf.truncate(entry_start);
        Err(err)
    }

    /// Insert a map entry. Keys must arrive in canonical order; duplicates are rejected.
    ///
    /// `f` must write exactly one item, the entry's value.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails, if keys are out of order, if duplicates are found, or
    /// `MapLenMismatch` if `f` writes no value or more than one.
    pub fn entry<F>(&mut self, key: &str, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut Encoder) -> Result<(), CborError>,
    {
        if self.remaining == 0 {
            return Err(CborError::new(
                ErrorCode::MapLenMismatch,
                self.enc.sink.position(),
            ));
        }

        let entry_start = self.enc.sink.buf.len();
        if let Err(err) = encode_text(&mut self.enc.sink, key) {
            return self.fail_entry(entry_start, err);
        }
        let key_end = self.enc.sink.buf.len();

        if let Some((ps, pe)) = self.prev_key_range {
            let prev = &self.enc.sink.buf[ps..pe];
            let curr = &self.enc.sink.buf[entry_start..key_end];
            if let Err(err) = check_map_key_order(prev, curr, entry_start) {
                return self.fail_entry(entry_start, err);
            }
        }

        let before = self.enc.items;
        let res = f(self.enc);
        let written = self.enc.items - before;
        self.enc.items = before;
        if let Err(err) = res {
            return self.fail_entry(entry_start, err);
        }
        if written != 1 {
            let err = CborError::new(ErrorCode::MapLenMismatch, self.enc.sink.position());
            return self.fail_entry(entry_start, err);
        }
        self.prev_key_range = Some((entry_start, key_end));
        self.remaining -= 1;
        Ok(())
    }
}

// Compares encoded keys; header length grows with payload length, so this matches key order.
fn check_map_key_order(prev: &[u8], curr: &[u8], key_start: usize) -> Result<(), CborError> {
    if prev == curr {
        return Err(CborError::new(ErrorCode::DuplicateMapKey, key_start));
    }
    if cmp_key_bytes(prev, curr).is_gt() {
        return Err(CborError::new(ErrorCode::NonCanonicalMapOrder, key_start));
    }
    Ok(())
}
