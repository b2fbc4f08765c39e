/// Default maximum nesting depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Decode-time resource limits.
///
/// The decoder walks nested items with a heap-allocated stack, so even
/// [`DecodeLimits::unlimited`] cannot exhaust the native call stack. Limits exist for callers
/// that also want to bound work and memory on hostile input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum total input length in bytes.
    pub max_input_bytes: usize,
    /// Maximum nesting depth of arrays and maps.
    pub max_depth: usize,
}

impl DecodeLimits {
    /// Limits that bound nothing beyond the input buffer itself.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_input_bytes: usize::MAX,
            max_depth: usize::MAX,
        }
    }

    /// Construct conservative limits derived from a maximum message size.
    ///
    /// - `max_input_bytes = max_message_bytes`
    /// - `max_depth = DEFAULT_MAX_DEPTH`
    #[must_use]
    pub const fn for_bytes(max_message_bytes: usize) -> Self {
        Self {
            max_input_bytes: max_message_bytes,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}
