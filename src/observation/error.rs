// src/observation/error.rs

/// Reasons a single observation could not be decoded.
///
/// The codec never returns these from its message-level entry points; they
/// decide whether an observation is skipped or decoding stops, and are logged.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// A field ran past the end of its observation or message.
    #[error("Truncated field: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// The header announces a feature this decoder does not handle.
    #[error("Unsupported observation feature: {0}")]
    Unsupported(&'static str),

    /// Class tag outside the known set.
    #[error("Unknown observation class {0:#04x}")]
    UnknownClass(u8),

    /// Declared observation length is shorter than the fixed header.
    #[error("Invalid observation length")]
    InvalidLength,

    /// A string observation or component is not UTF-8.
    #[error("String value is not valid UTF-8")]
    InvalidUtf8,

    /// Time value or offset cannot be represented as a calendar timestamp.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Bundles nested deeper than the configured limit.
    #[error("Observation bundles nested too deeply")]
    BundleTooDeep,

    /// Compound observation component of a class that cannot be a component.
    #[error("Unsupported component class {0:#04x}")]
    UnsupportedComponentClass(u8),

    /// TLV value longer than 8 bytes.
    #[error("TLV value of {0} bytes does not fit in 64 bits")]
    TlvValueTooLong(u8),
}
