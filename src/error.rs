use core::fmt;

/// The failure class of an error.
///
/// Callers usually only need the kind: a [`ErrorKind::Truncation`] may succeed once more bytes
/// arrive, while every other decode kind is a permanent rejection of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The buffer ended before a header, argument or declared payload was complete.
    Truncation,
    /// Reserved additional-info value, indefinite length, or unsupported simple value.
    MalformedHeader,
    /// Overlong argument encoding, or map keys not strictly increasing.
    NonCanonical,
    /// Wrong type in a position with a fixed type (map keys, tag payloads, AtJSON leaves).
    TypeViolation,
    /// Value outside what DAG-CBOR can represent (encode side).
    DomainViolation,
    /// A whole-buffer decode left bytes after the object.
    IncompleteConsumption,
    /// A caller-configured limit was hit, or allocation failed.
    ResourceLimit,
}

/// A structured error code identifying the reason an item was rejected.
///
/// This enum is string-free to support `no_std`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Unexpected end-of-input while decoding.
    UnexpectedEof,
    /// A declared length does not fit the address space (decode).
    LengthOverflow,
    /// A length or count is too large to encode as a CBOR argument (encode).
    LengthTooLarge,

    /// Reserved additional-info value (28..=30, or 31 where no length is expected).
    ReservedAdditionalInfo,
    /// Indefinite-length encoding was used.
    IndefiniteLengthForbidden,
    /// Simple value other than `false`, `true`, `null`, or a float width other than 64 bits.
    UnsupportedSimpleValue,

    /// Integer or length argument not encoded in its shortest form.
    NonCanonicalEncoding,
    /// Map keys are out of canonical order, or repeated.
    NonCanonicalMapOrder,

    /// Map key was not a text string.
    MapKeyMustBeText,
    /// Text string or map key is not valid UTF-8.
    Utf8Invalid,
    /// A tag other than 42 was used.
    ForbiddenTag,
    /// Tag 42 payload is not a byte string starting with the identity multibase prefix.
    MalformedLink,
    /// Decoded float64 bit pattern is NaN or an infinity.
    ForbiddenFloatBits,
    /// A raw byte string was given to the encoder in AtJSON mode.
    UnexpectedBytesInAtJson,
    /// A raw link was given to the encoder in AtJSON mode.
    UnexpectedLinkInAtJson,
    /// The value of a `$bytes` / `$link` marker is not a text string.
    MarkerValueMustBeText,

    /// Integer outside `-(2^64) ..= 2^64 - 1`.
    IntegerOutOfRange,
    /// NaN or an infinity given to the encoder.
    FloatNotFinite,
    /// Two map entries share a key.
    DuplicateMapKey,
    /// A `$bytes` marker does not hold valid base64.
    InvalidBase64,
    /// A `$link` marker or multibase string does not hold valid base32.
    InvalidBase32,
    /// Multibase prefix other than `b` (base32 lowercase).
    UnsupportedMultibase,
    /// An array builder emitted a different number of items than declared.
    ArrayLenMismatch,
    /// A map builder emitted a different number of entries than declared.
    MapLenMismatch,

    /// Bytes remain after the single object.
    TrailingBytes,

    /// Input exceeds the configured byte limit.
    InputLimitExceeded,
    /// Nesting depth limit exceeded.
    DepthLimitExceeded,
    /// Memory allocation failed while building owned structures.
    AllocationFailed,
}

impl ErrorCode {
    /// Map the code onto its failure class.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::UnexpectedEof | Self::LengthOverflow => ErrorKind::Truncation,
            Self::ReservedAdditionalInfo
            | Self::IndefiniteLengthForbidden
            | Self::UnsupportedSimpleValue => ErrorKind::MalformedHeader,
            Self::NonCanonicalEncoding | Self::NonCanonicalMapOrder => ErrorKind::NonCanonical,
            Self::MapKeyMustBeText
            | Self::Utf8Invalid
            | Self::ForbiddenTag
            | Self::MalformedLink
            | Self::ForbiddenFloatBits
            | Self::UnexpectedBytesInAtJson
            | Self::UnexpectedLinkInAtJson
            | Self::MarkerValueMustBeText => ErrorKind::TypeViolation,
            Self::FloatNotFinite
            | Self::IntegerOutOfRange
            | Self::DuplicateMapKey
            | Self::InvalidBase64
            | Self::InvalidBase32
            | Self::UnsupportedMultibase
            | Self::ArrayLenMismatch
            | Self::MapLenMismatch
            | Self::LengthTooLarge => ErrorKind::DomainViolation,
            Self::TrailingBytes => ErrorKind::IncompleteConsumption,
            Self::InputLimitExceeded | Self::DepthLimitExceeded | Self::AllocationFailed => {
                ErrorKind::ResourceLimit
            }
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEof => "unexpected end of input",
            Self::LengthOverflow => "length overflow",
            Self::LengthTooLarge => "length too large to encode",
            Self::ReservedAdditionalInfo => "reserved additional info value",
            Self::IndefiniteLengthForbidden => "indefinite length forbidden",
            Self::UnsupportedSimpleValue => "unsupported simple value",
            Self::NonCanonicalEncoding => "integer not minimally encoded",
            Self::NonCanonicalMapOrder => "non-canonical map key ordering",
            Self::MapKeyMustBeText => "map keys must be text strings",
            Self::Utf8Invalid => "text must be valid UTF-8",
            Self::ForbiddenTag => "only tag 42 is allowed",
            Self::MalformedLink => "invalid CID in tag 42",
            Self::ForbiddenFloatBits => "NaN and infinity bit patterns are not allowed",
            Self::FloatNotFinite => "NaNs and +/-infinities are not allowed",
            Self::UnexpectedBytesInAtJson => "unexpected byte string in atjson mode",
            Self::UnexpectedLinkInAtJson => "unexpected link in atjson mode",
            Self::MarkerValueMustBeText => "$bytes/$link marker value must be a string",
            Self::IntegerOutOfRange => "integer out of range",
            Self::DuplicateMapKey => "duplicate map key",
            Self::InvalidBase64 => "invalid base64",
            Self::InvalidBase32 => "invalid base32",
            Self::UnsupportedMultibase => "invalid/unsupported multibase prefix",
            Self::ArrayLenMismatch => "array length mismatch",
            Self::MapLenMismatch => "map length mismatch",
            Self::TrailingBytes => "did not parse to end of buffer",
            Self::InputLimitExceeded => "input exceeds byte limit",
            Self::DepthLimitExceeded => "nesting depth limit exceeded",
            Self::AllocationFailed => "allocation failed",
        }
    }
}

/// A DAG-CBOR error with a stable code and a byte offset.
///
/// For decode errors `offset` points at the header byte of the item that failed. For encode
/// errors it is the number of output bytes written when encoding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CborError {
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset where the error was detected.
    pub offset: usize,
}

impl CborError {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }

    /// The failure class of this error.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        self.code.kind()
    }

    /// Returns true iff more input could turn this failure into a success.
    #[inline]
    #[must_use]
    pub const fn is_truncation(self) -> bool {
        matches!(self.code.kind(), ErrorKind::Truncation)
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dag-cbor error at {}: {}", self.offset, self.code.message())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CborError {}
