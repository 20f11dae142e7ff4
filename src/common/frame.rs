// src/common/frame.rs

use super::flags::FlagBit;

/// Role carried in bits 0-1 of a segmentation header byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SegmentRole {
    /// `00`: a middle segment.
    Continuation,
    /// `01`: opens a multi-segment message.
    First,
    /// `10`: closes a multi-segment message.
    Last,
    /// `11`: a complete message in one write.
    Single,
}

/// Largest value of the rolling segment counter.
pub const SEGMENT_SEQUENCE_MAX: u8 = 63;

/// Decoded 1-byte segmentation header.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SegmentHeader {
    pub role: SegmentRole,
    /// Rolling counter, 0-63.
    pub sequence: u8,
}

impl SegmentHeader {
    pub fn from_byte(byte: u8) -> Self {
        let role = match byte & 0b11 {
            0b00 => SegmentRole::Continuation,
            0b01 => SegmentRole::First,
            0b10 => SegmentRole::Last,
            _ => SegmentRole::Single,
        };
        SegmentHeader { role, sequence: (byte >> 2) & SEGMENT_SEQUENCE_MAX }
    }

    pub fn to_byte(self) -> u8 {
        let role = match self.role {
            SegmentRole::Continuation => 0b00,
            SegmentRole::First => 0b01,
            SegmentRole::Last => 0b10,
            SegmentRole::Single => 0b11,
        };
        ((self.sequence & SEGMENT_SEQUENCE_MAX) << 2) | role
    }

    /// Sequence number a segment following this one must carry.
    #[inline]
    pub fn next_sequence(sequence: u8) -> u8 {
        if sequence >= SEGMENT_SEQUENCE_MAX {
            0
        } else {
            sequence + 1
        }
    }
}

/// Marker bits in the first byte of a length-prefixed frame fragment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FrameMarker {
    /// Fragment opens a frame; its payload begins with the 2-byte length.
    First,
    /// Fragment closes a frame.
    Last,
}

impl FlagBit for FrameMarker {
    fn position(self) -> u32 {
        match self {
            FrameMarker::First => 0,
            FrameMarker::Last => 1,
        }
    }
}

/// Size of the little-endian length prefix opening a frame.
pub const FRAME_LENGTH_PREFIX: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roles() {
        assert_eq!(SegmentHeader::from_byte(0b0000_0000).role, SegmentRole::Continuation);
        assert_eq!(SegmentHeader::from_byte(0b0000_0001).role, SegmentRole::First);
        assert_eq!(SegmentHeader::from_byte(0b0000_0010).role, SegmentRole::Last);
        assert_eq!(SegmentHeader::from_byte(0b0000_0011).role, SegmentRole::Single);
    }

    #[test]
    fn test_header_sequence_bits() {
        let header = SegmentHeader::from_byte(0b1111_1101);
        assert_eq!(header.role, SegmentRole::First);
        assert_eq!(header.sequence, 63);

        let header = SegmentHeader { role: SegmentRole::Last, sequence: 5 };
        assert_eq!(header.to_byte(), 0b0001_0110);
        assert_eq!(SegmentHeader::from_byte(header.to_byte()), header);
    }

    #[test]
    fn test_next_sequence_wraps() {
        assert_eq!(SegmentHeader::next_sequence(0), 1);
        assert_eq!(SegmentHeader::next_sequence(62), 63);
        assert_eq!(SegmentHeader::next_sequence(63), 0);
    }
}
