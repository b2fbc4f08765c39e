#[cfg(feature = "simdutf8")]
use simdutf8::basic as simd_utf8;

use crate::{CborError, ErrorCode};

/// Validates UTF-8 bytes taken from the item at `off` and returns a borrowed `&str`.
#[inline]
pub fn validate(bytes: &[u8], off: usize) -> Result<&str, CborError> {
    #[cfg(feature = "simdutf8")]
    {
        simd_utf8::from_utf8(bytes).map_err(|_| CborError::new(ErrorCode::Utf8Invalid, off))
    }

    #[cfg(not(feature = "simdutf8"))]
    {
        core::str::from_utf8(bytes).map_err(|_| CborError::new(ErrorCode::Utf8Invalid, off))
    }
}
