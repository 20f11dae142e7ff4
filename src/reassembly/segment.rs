// src/reassembly/segment.rs

use super::InvalidSegmentReason;
use crate::common::{
    address::DeviceAddress,
    frame::{SegmentHeader, SegmentRole},
};

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use log::{debug, warn};

/// Result of feeding one notification to the [`SegmentReassembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// More segments are needed.
    Pending,
    /// A full message, segmentation headers removed.
    Complete(Vec<u8>),
    /// The segment was rejected and the device's session reset.
    Invalid(InvalidSegmentReason),
}

/// Per-device accumulation state.
#[derive(Debug, Default)]
struct SegmentSession {
    accumulated: Vec<u8>,
    /// `None` until a first/single segment has been seen.
    last_sequence: Option<u8>,
}

/// Rebuilds messages from segments prefixed with a 1-byte segmentation header.
///
/// States per device: `Empty -> Accumulating -> Complete | Invalid`, where both
/// terminal states drop the session so the next message starts empty.
#[derive(Debug, Default)]
pub struct SegmentReassembler {
    sessions: BTreeMap<DeviceAddress, SegmentSession>,
}

impl SegmentReassembler {
    pub fn new() -> Self {
        SegmentReassembler { sessions: BTreeMap::new() }
    }

    /// Processes one notification from `address`.
    ///
    /// # Arguments
    ///
    /// * `address`: Device the bytes came from.
    /// * `bytes`: The raw notification, segmentation header included.
    pub fn push(&mut self, address: DeviceAddress, bytes: &[u8]) -> SegmentOutcome {
        if bytes.len() < 2 {
            self.sessions.remove(&address);
            warn!("segment from {} too short ({} bytes)", address, bytes.len());
            return SegmentOutcome::Invalid(InvalidSegmentReason::Length);
        }

        let header = SegmentHeader::from_byte(bytes[0]);
        let payload = &bytes[1..];

        match header.role {
            SegmentRole::Single => {
                self.sessions.remove(&address);
                debug!("single segment from {} (seq {})", address, header.sequence);
                SegmentOutcome::Complete(payload.to_vec())
            }
            SegmentRole::First => {
                let session = self.sessions.entry(address).or_default();
                session.accumulated.clear();
                session.accumulated.extend_from_slice(payload);
                session.last_sequence = Some(header.sequence);
                SegmentOutcome::Pending
            }
            SegmentRole::Continuation | SegmentRole::Last => {
                let expected = self
                    .sessions
                    .get(&address)
                    .and_then(|session| session.last_sequence)
                    .map(SegmentHeader::next_sequence);

                if expected != Some(header.sequence) {
                    self.sessions.remove(&address);
                    warn!(
                        "segment from {} out of sequence: expected {:?}, got {}",
                        address, expected, header.sequence
                    );
                    return SegmentOutcome::Invalid(InvalidSegmentReason::OutOfSequence);
                }

                let session = self.sessions.entry(address).or_default();
                session.accumulated.extend_from_slice(payload);
                session.last_sequence = Some(header.sequence);

                if header.role == SegmentRole::Last {
                    let message = self
                        .sessions
                        .remove(&address)
                        .map(|session| session.accumulated)
                        .unwrap_or_default();
                    debug!("reassembled {} bytes from {}", message.len(), address);
                    SegmentOutcome::Complete(message)
                } else {
                    SegmentOutcome::Pending
                }
            }
        }
    }

    /// Drops any partial message held for `address` (device disconnected).
    pub fn reset(&mut self, address: &DeviceAddress) {
        self.sessions.remove(address);
    }

    /// Returns `true` while a multi-segment message from `address` is open.
    pub fn is_accumulating(&self, address: &DeviceAddress) -> bool {
        self.sessions.contains_key(address)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const DEVICE: DeviceAddress = DeviceAddress::new([0xC0, 0xFF, 0xEE, 0x00, 0x00, 0x01]);
    const OTHER: DeviceAddress = DeviceAddress::new([0xC0, 0xFF, 0xEE, 0x00, 0x00, 0x02]);

    fn segment(role: SegmentRole, sequence: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![SegmentHeader { role, sequence }.to_byte()];
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Splits `payload` into `chunks` segments starting at `first_sequence`.
    fn split(payload: &[u8], chunk: usize, first_sequence: u8) -> Vec<Vec<u8>> {
        let pieces: Vec<&[u8]> = payload.chunks(chunk).collect();
        let mut sequence = first_sequence;
        let mut segments = Vec::new();
        for (index, piece) in pieces.iter().enumerate() {
            let role = match (index == 0, index == pieces.len() - 1) {
                (true, true) => SegmentRole::Single,
                (true, false) => SegmentRole::First,
                (false, true) => SegmentRole::Last,
                (false, false) => SegmentRole::Continuation,
            };
            segments.push(segment(role, sequence, piece));
            sequence = SegmentHeader::next_sequence(sequence);
        }
        segments
    }

    fn feed(reassembler: &mut SegmentReassembler, segments: &[Vec<u8>]) -> SegmentOutcome {
        let mut outcome = SegmentOutcome::Pending;
        for bytes in segments {
            outcome = reassembler.push(DEVICE, bytes);
        }
        outcome
    }

    #[test]
    fn test_single_segment_message() {
        let mut reassembler = SegmentReassembler::new();
        let outcome = reassembler.push(DEVICE, &segment(SegmentRole::Single, 9, &[1, 2, 3]));
        assert_eq!(outcome, SegmentOutcome::Complete(vec![1, 2, 3]));
        assert!(!reassembler.is_accumulating(&DEVICE));
    }

    #[test]
    fn test_multi_segment_round_trip() {
        let payload: Vec<u8> = (0..=200u8).collect();
        for chunk in [1usize, 7, 19, 100, 200] {
            let mut reassembler = SegmentReassembler::new();
            let segments = split(&payload, chunk, 0);
            assert_eq!(feed(&mut reassembler, &segments), SegmentOutcome::Complete(payload.clone()));
            assert!(!reassembler.is_accumulating(&DEVICE));
        }
    }

    #[test]
    fn test_pending_until_last() {
        let mut reassembler = SegmentReassembler::new();
        assert_eq!(reassembler.push(DEVICE, &segment(SegmentRole::First, 0, &[1])), SegmentOutcome::Pending);
        assert!(reassembler.is_accumulating(&DEVICE));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Continuation, 1, &[2])),
            SegmentOutcome::Pending
        );
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 2, &[3])),
            SegmentOutcome::Complete(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_short_input_is_length_error() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 0, &[1, 2]));
        assert_eq!(
            reassembler.push(DEVICE, &[0x04]),
            SegmentOutcome::Invalid(InvalidSegmentReason::Length)
        );
        assert!(!reassembler.is_accumulating(&DEVICE));
        assert_eq!(reassembler.push(DEVICE, &[]), SegmentOutcome::Invalid(InvalidSegmentReason::Length));
    }

    #[test]
    fn test_out_of_sequence_resets_and_next_first_starts_fresh() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 4, &[0xAA, 0xBB]));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Continuation, 6, &[0xCC])),
            SegmentOutcome::Invalid(InvalidSegmentReason::OutOfSequence)
        );
        assert!(!reassembler.is_accumulating(&DEVICE));

        reassembler.push(DEVICE, &segment(SegmentRole::First, 7, &[0x01]));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 8, &[0x02])),
            SegmentOutcome::Complete(vec![0x01, 0x02])
        );
    }

    #[test]
    fn test_out_of_sequence_last_segment() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 10, &[1]));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 10, &[2])),
            SegmentOutcome::Invalid(InvalidSegmentReason::OutOfSequence)
        );
    }

    #[test]
    fn test_continuation_without_first_is_rejected() {
        let mut reassembler = SegmentReassembler::new();
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Continuation, 0, &[1])),
            SegmentOutcome::Invalid(InvalidSegmentReason::OutOfSequence)
        );
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 1, &[1])),
            SegmentOutcome::Invalid(InvalidSegmentReason::OutOfSequence)
        );
    }

    #[test]
    fn test_sequence_wraparound() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 62, &[1]));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Continuation, 63, &[2])),
            SegmentOutcome::Pending
        );
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 0, &[3])),
            SegmentOutcome::Complete(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_first_segment_replaces_stale_accumulation() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 0, &[9, 9, 9]));
        reassembler.push(DEVICE, &segment(SegmentRole::First, 20, &[1]));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 21, &[2])),
            SegmentOutcome::Complete(vec![1, 2])
        );
    }

    #[test]
    fn test_devices_are_independent() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 0, &[0xD1]));
        reassembler.push(OTHER, &segment(SegmentRole::First, 30, &[0xD2]));

        assert_eq!(
            reassembler.push(OTHER, &segment(SegmentRole::Last, 31, &[0xE2])),
            SegmentOutcome::Complete(vec![0xD2, 0xE2])
        );
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 1, &[0xE1])),
            SegmentOutcome::Complete(vec![0xD1, 0xE1])
        );
    }

    #[test]
    fn test_reset_discards_partial_message() {
        let mut reassembler = SegmentReassembler::new();
        reassembler.push(DEVICE, &segment(SegmentRole::First, 0, &[1]));
        reassembler.reset(&DEVICE);
        assert!(!reassembler.is_accumulating(&DEVICE));
        assert_eq!(
            reassembler.push(DEVICE, &segment(SegmentRole::Last, 1, &[2])),
            SegmentOutcome::Invalid(InvalidSegmentReason::OutOfSequence)
        );
    }
}
