//! # canon-dag-cbor
//!
//! Strict canonical **DAG-CBOR** decoding and encoding for content-addressed data.
//!
//! ## Design principles
//!
//! - **Canonical bytes are the identity.**
//!   Every value has exactly one legal encoding. The decoder rejects any input that is valid
//!   CBOR but not that encoding, so a CID computed over decoded-then-re-encoded data always
//!   matches the original block.
//! - **Untrusted input is the normal case.**
//!   Decode and encode walk nested containers with an explicit heap stack, allocations sized
//!   from the input are fallible, and truncated input is reported separately from malformed
//!   input ([`ErrorKind::Truncation`]).
//! - **JSON interop is a mode, not a second parser.**
//!   [`Mode::AtJson`] swaps byte strings and links for `{"$bytes": ..}` / `{"$link": ..}`
//!   marker maps exactly where they would be produced or consumed.
//!
//! ## Profile
//!
//! - Definite-length items only; every argument in its shortest form.
//! - Integers in `-(2^64) ..= 2^64 - 1` (major types 0 and 1).
//! - Floats only as finite float64.
//! - Simple values only `false`, `true`, `null`.
//! - Map keys are text, strictly increasing by (byte length, then bytes).
//! - Only tag 42 (CID link), wrapping a byte string `0x00 ++ cid`.
//!
//! ## Example
//!
//! ```
//! use canon_dag_cbor::{decode, encode, Mode, Value};
//!
//! let value = Value::map_sorted(vec![
//!     ("name".into(), Value::from("alice")),
//!     ("id".into(), Value::from(7u64)),
//! ])
//! .unwrap();
//! let bytes = encode(&value, Mode::Plain).unwrap();
//! let (decoded, used) = decode(&bytes, Mode::Plain).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(used, bytes.len());
//! ```
//!
//! ## Feature flags
//!
//! - `std` *(default)*: implements `std::error::Error` for [`CborError`].
//! - `sha2` *(default)*: SHA-256 CID minting and verification on [`Cid`].
//! - `serde`: `Serialize`/`Deserialize` for [`Value`] and [`Cid`].
//! - `simdutf8`: SIMD-accelerated UTF-8 validation where supported.
//!
//! ## `no_std`
//!
//! The crate is `no_std` compatible with an allocator.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

extern crate alloc;

mod alloc_util;
mod atjson;
mod cid;
mod decode;
mod encode;
mod error;
mod limits;
mod multibase;
mod profile;
#[cfg(feature = "serde")]
mod serde_impl;
mod stream;
mod utf8;
mod value;
mod wire;

pub use crate::atjson::{Mode, BYTES_MARKER, LINK_MARKER};
pub use crate::cid::Cid;
pub use crate::decode::{decode, decode_exact, decode_with_limits};
pub use crate::encode::{encode, ArrayEncoder, Encoder, MapEncoder};
pub use crate::error::{CborError, ErrorCode, ErrorKind};
pub use crate::limits::{DecodeLimits, DEFAULT_MAX_DEPTH};
pub use crate::profile::{LINK_TAG, MULTIBASE_IDENTITY};
pub use crate::stream::{decode_stream, DecodeStream};
pub use crate::value::Value;
