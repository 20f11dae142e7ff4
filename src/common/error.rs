// src/common/error.rs

/// Errors surfaced by the outbound side of the crate (RACP requests and the
/// transport writes that carry them).
///
/// Inbound byte processing never returns this type: framing, decode and RACP
/// response problems are reported as events instead.
#[derive(Debug, thiserror::Error)]
pub enum GhsError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying error from the transport implementation.
    #[error("Transport error: {0:?}")]
    Io(E),

    /// Text could not be parsed as a `AA:BB:CC:DD:EE:FF` device address.
    #[error("Invalid device address")]
    InvalidAddress,

    /// A RACP procedure other than abort was requested while another one is
    /// still waiting for its response.
    #[error("RACP procedure already in progress (opcode {opcode:#04x})")]
    ProcedureInProgress { opcode: u8 },

    /// An encoded command did not fit into its fixed-size buffer.
    #[error("Command buffer overflow: needed {needed}, capacity {capacity}")]
    CommandBufferOverflow { needed: usize, capacity: usize },
}
