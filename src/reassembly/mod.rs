// src/reassembly/mod.rs

//! Reassembly of GHS messages from low-MTU notifications.
//!
//! Two framing disciplines are supported, each keeping one accumulator per
//! device address:
//!
//! - [`SegmentReassembler`]: 1-byte segmentation header with a role and a
//!   rolling 6-bit sequence number (health observation characteristics).
//! - [`FrameReassembler`]: first/last marker bits plus a 2-byte little-endian
//!   total length at the start of the frame.
//!
//! Both report every failure as an [`InvalidSegmentReason`] and reset the
//! device's accumulator, so the next message always starts from scratch.

pub mod framed;
pub mod segment;

pub use framed::{is_packet_overflow, is_receive_complete, FrameOutcome, FrameReassembler};
pub use segment::{SegmentOutcome, SegmentReassembler};

/// Why a fragment was rejected.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, thiserror::Error)]
pub enum InvalidSegmentReason {
    /// Fragment too short to carry its header (and, for frames, the length prefix).
    #[error("fragment too short")]
    Length,
    /// Header does not fit the current state (e.g. a frame continuation with no open frame).
    #[error("unexpected fragment header")]
    Header,
    /// Sequence number is not the successor of the previous segment's.
    #[error("segment out of sequence")]
    OutOfSequence,
    /// Final frame fragment arrived before the declared length was reached.
    #[error("frame length does not match its declared length")]
    LengthMismatch,
}
