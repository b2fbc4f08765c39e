use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::multibase;
use crate::CborError;

const CID_V1: u8 = 0x01;
const CODEC_DAG_CBOR: u8 = 0x71;
const CODEC_RAW: u8 = 0x55;
const MULTIHASH_SHA2_256: u8 = 0x12;
const SHA2_256_LEN: u8 = 0x20;
const SHA256_CID_LEN: usize = 4 + 32;

/// A content identifier, held as its raw binary form.
///
/// The codec treats a CID as an opaque byte string: construction does not validate the
/// version, codec or multihash, and equality, ordering and hashing are byte-wise.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cid {
    bytes: Vec<u8>,
}

impl Cid {
    /// Wrap raw CID bytes without validation.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Copy raw CID bytes without validation.
    #[inline]
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Parse the multibase text form (`b` + lowercase base32).
    ///
    /// Decoding is case-insensitive; only the `b` prefix is supported.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMultibase` for any other prefix and `InvalidBase32` for a malformed
    /// body.
    pub fn from_multibase(text: &str) -> Result<Self, CborError> {
        let bytes =
            multibase::from_base32_multibase(text).map_err(|code| CborError::new(code, 0))?;
        Ok(Self { bytes })
    }

    /// Borrow the raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume and return the raw bytes.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The multibase text form: `b` followed by lowercase unpadded base32.
    #[must_use]
    pub fn to_multibase(&self) -> String {
        multibase::to_base32_multibase(&self.bytes)
    }

    /// Returns true iff this is a CIDv1 naming a DAG-CBOR block by its SHA-256.
    #[must_use]
    pub fn is_dag_cbor_sha256(&self) -> bool {
        self.has_sha256_prefix(CODEC_DAG_CBOR)
    }

    /// Returns true iff this is a CIDv1 naming a raw block by its SHA-256.
    #[must_use]
    pub fn is_raw_sha256(&self) -> bool {
        self.has_sha256_prefix(CODEC_RAW)
    }

    fn has_sha256_prefix(&self, codec: u8) -> bool {
        self.bytes.len() == SHA256_CID_LEN
            && self.bytes[..4] == [CID_V1, codec, MULTIHASH_SHA2_256, SHA2_256_LEN]
    }

    /// Mint the CIDv1 (dag-cbor, sha2-256) of an encoded block.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    #[must_use]
    pub fn dag_cbor_sha256(block: &[u8]) -> Self {
        Self::sha256_with_codec(CODEC_DAG_CBOR, block)
    }

    /// Mint the CIDv1 (raw, sha2-256) of a block.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    #[must_use]
    pub fn raw_sha256(block: &[u8]) -> Self {
        Self::sha256_with_codec(CODEC_RAW, block)
    }

    /// Returns true iff this is a sha2-256 CIDv1 (dag-cbor or raw) whose digest matches `block`.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    #[must_use]
    pub fn verifies(&self, block: &[u8]) -> bool {
        if !(self.is_dag_cbor_sha256() || self.is_raw_sha256()) {
            return false;
        }
        self.bytes[4..] == sha256(block)
    }

    #[cfg(feature = "sha2")]
    fn sha256_with_codec(codec: u8, block: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(SHA256_CID_LEN);
        bytes.extend_from_slice(&[CID_V1, codec, MULTIHASH_SHA2_256, SHA2_256_LEN]);
        bytes.extend_from_slice(&sha256(block));
        Self { bytes }
    }
}

#[cfg(feature = "sha2")]
fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut h = Sha256::new();
    h.update(data);
    let out = h.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(out.as_slice());
    digest
}

impl AsRef<[u8]> for Cid {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Cid {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&[u8]> for Cid {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cid(")?;
        for b in &self.bytes {
            write!(f, "{b:02x}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_multibase())
    }
}
