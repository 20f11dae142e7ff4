// src/common/response/error.rs

/// Error type specific to RACP response parsing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RacpParseError {
    /// Input buffer was empty.
    #[error("Empty RACP response")]
    EmptyInput,
    /// Response is too short for the layout its op code implies.
    #[error("RACP response too short: needed {needed}, got {got}")]
    TooShort { needed: usize, got: usize },
    /// First byte is not a response op code.
    #[error("Unexpected RACP response op code {0:#04x}")]
    UnexpectedOpCode(u8),
}
