//! Decoding buffers that hold several back-to-back objects.
//!
//! DAG-CBOR carries exactly one object per block. Some containers (for example record logs and
//! firehose frames) concatenate several objects with no separator; this module reads such
//! buffers. It is a deliberate relaxation of the one-object rule and should only be used where
//! the surrounding format calls for it.

use crate::decode::decode_from;
use crate::{CborError, DecodeLimits, Mode, Value};

/// Lazy iterator over the objects in a concatenated buffer.
///
/// Yields one item per object, in order, and ends exactly at the end of the buffer. After the
/// first error the iterator is fused and yields nothing further.
#[derive(Debug, Clone)]
pub struct DecodeStream<'a> {
    data: &'a [u8],
    pos: usize,
    mode: Mode,
    failed: bool,
}

impl<'a> DecodeStream<'a> {
    /// Start reading objects at the beginning of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8], mode: Mode) -> Self {
        Self {
            data,
            pos: 0,
            mode,
            failed: false,
        }
    }

    /// Offset of the next object to be decoded.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for DecodeStream<'_> {
    type Item = Result<Value, CborError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos == self.data.len() {
            return None;
        }
        match decode_from(self.data, self.pos, self.mode, DecodeLimits::unlimited()) {
            Ok((value, end)) => {
                // The decoder never reads past its input.
                assert!(
                    end <= self.data.len(),
                    "decoder overshot the buffer: {end} > {}",
                    self.data.len()
                );
                self.pos = end;
                Some(Ok(value))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl core::iter::FusedIterator for DecodeStream<'_> {}

/// Decode every object in a buffer of concatenated canonical objects.
///
/// An empty buffer yields nothing. Each object is decoded with the same rules as
/// [`crate::decode`]; error offsets are relative to the start of `bytes`.
///
/// # Panics
///
/// Panics if the decoder reports consuming past the end of `bytes`, which would be a bug in
/// this crate rather than a property of the input.
#[must_use]
pub const fn decode_stream(bytes: &[u8], mode: Mode) -> DecodeStream<'_> {
    DecodeStream::new(bytes, mode)
}
