// src/reassembly/framed.rs

use super::InvalidSegmentReason;
use crate::common::{
    address::DeviceAddress,
    flags::FlagSet,
    frame::{FrameMarker, FRAME_LENGTH_PREFIX},
};

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use log::{debug, warn};

/// Result of feeding one fragment to the [`FrameReassembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// More fragments are needed.
    Pending,
    /// A full frame, length prefix removed.
    Complete(Vec<u8>),
    /// The accumulated bytes outgrew the declared body plus its length prefix
    /// before the last fragment arrived.
    Overflow(Vec<u8>),
    /// The fragment was rejected and the device's accumulator reset.
    Invalid(InvalidSegmentReason),
}

/// Declared frame length read from the accumulator's 2-byte prefix.
fn declared_length(accumulated: &[u8]) -> Option<usize> {
    match accumulated {
        [low, high, ..] => Some(u16::from_le_bytes([*low, *high]) as usize),
        _ => None,
    }
}

/// Returns `true` when `accumulated` (prefix included) holds exactly the
/// declared number of bytes.
pub fn is_receive_complete(accumulated: &[u8]) -> bool {
    declared_length(accumulated).is_some_and(|declared| accumulated.len() == declared + FRAME_LENGTH_PREFIX)
}

/// Returns `true` when `accumulated` (prefix included) is longer than the
/// declared length.
///
/// The prefix bytes count against the declared length here, unlike in
/// [`is_receive_complete`].
pub fn is_packet_overflow(accumulated: &[u8]) -> bool {
    declared_length(accumulated).is_some_and(|declared| accumulated.len() > declared)
}

/// A frame still waiting for its last fragment is only dropped once it holds
/// more than the declared body plus the prefix.
fn exceeds_frame(accumulated: &[u8]) -> bool {
    declared_length(accumulated).is_some_and(|declared| accumulated.len() > declared + FRAME_LENGTH_PREFIX)
}

/// Rebuilds frames whose fragments start with a first/last marker byte and
/// whose first payload begins with a little-endian `u16` frame length.
#[derive(Debug, Default)]
pub struct FrameReassembler {
    accumulators: BTreeMap<DeviceAddress, Vec<u8>>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        FrameReassembler { accumulators: BTreeMap::new() }
    }

    /// Processes one fragment from `address`.
    pub fn push(&mut self, address: DeviceAddress, bytes: &[u8]) -> FrameOutcome {
        let Some((&marker_byte, payload)) = bytes.split_first() else {
            self.accumulators.remove(&address);
            warn!("empty frame fragment from {}", address);
            return FrameOutcome::Invalid(InvalidSegmentReason::Length);
        };
        let markers = FlagSet::<FrameMarker>::from_bits(u32::from(marker_byte));

        if markers.has_flag(FrameMarker::First) {
            if payload.len() < FRAME_LENGTH_PREFIX {
                self.accumulators.remove(&address);
                warn!("first frame fragment from {} has no length prefix", address);
                return FrameOutcome::Invalid(InvalidSegmentReason::Length);
            }
            let accumulated = self.accumulators.entry(address).or_default();
            accumulated.clear();
            accumulated.extend_from_slice(payload);
        } else {
            match self.accumulators.get_mut(&address) {
                Some(accumulated) => accumulated.extend_from_slice(payload),
                None => {
                    warn!("frame continuation from {} without an open frame", address);
                    return FrameOutcome::Invalid(InvalidSegmentReason::Header);
                }
            }
        }

        if markers.has_flag(FrameMarker::Last) {
            let mut accumulated = self.accumulators.remove(&address).unwrap_or_default();
            if !is_receive_complete(&accumulated) {
                warn!(
                    "frame from {} closed at {} bytes, declared {:?}",
                    address,
                    accumulated.len(),
                    declared_length(&accumulated)
                );
                return FrameOutcome::Invalid(InvalidSegmentReason::LengthMismatch);
            }
            let frame = accumulated.split_off(FRAME_LENGTH_PREFIX);
            debug!("reassembled {}-byte frame from {}", frame.len(), address);
            return FrameOutcome::Complete(frame);
        }

        if self.accumulators.get(&address).is_some_and(|accumulated| exceeds_frame(accumulated)) {
            let accumulated = self.accumulators.remove(&address).unwrap_or_default();
            warn!("frame from {} overflowed at {} bytes", address, accumulated.len());
            return FrameOutcome::Overflow(accumulated);
        }

        FrameOutcome::Pending
    }

    /// Completion check on the bytes accumulated so far for `address`.
    pub fn is_device_receive_complete(&self, address: &DeviceAddress) -> bool {
        self.accumulators.get(address).is_some_and(|accumulated| is_receive_complete(accumulated))
    }

    /// Overflow check on the bytes accumulated so far for `address`.
    pub fn is_device_packet_overflow(&self, address: &DeviceAddress) -> bool {
        self.accumulators.get(address).is_some_and(|accumulated| is_packet_overflow(accumulated))
    }

    /// Drops any partial frame held for `address`.
    pub fn reset(&mut self, address: &DeviceAddress) {
        self.accumulators.remove(address);
    }
}
