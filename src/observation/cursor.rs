// src/observation/cursor.rs

use super::error::DecodeError;
use crate::common::types::MderFloat;

/// Forward-only reader over a borrowed byte slice.
///
/// All multi-byte reads are big-endian, the byte order of ACOM payloads.
#[derive(Debug, Clone)]
pub(crate) struct ByteCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buffer: &'a [u8]) -> Self {
        ByteCursor { buffer, position: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrows the next `count` bytes and advances past them.
    pub(crate) fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::Truncated { needed: count, remaining: self.remaining() });
        }
        let bytes = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_u8()? as i8)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.read_array().map(i32::from_be_bytes)
    }

    /// Reads a 48-bit unsigned integer (time values, tick counters).
    pub(crate) fn read_u48(&mut self) -> Result<u64, DecodeError> {
        let bytes: [u8; 6] = self.read_array()?;
        Ok(bytes.iter().fold(0u64, |value, byte| (value << 8) | u64::from(*byte)))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_array().map(u64::from_be_bytes)
    }

    pub(crate) fn read_mder(&mut self) -> Result<MderFloat, DecodeError> {
        self.read_array().map(MderFloat::from_be_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_big_endian() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u16(), Ok(0x0102));
        assert_eq!(cursor.read_u32(), Ok(0x0304_0506));
        assert_eq!(cursor.position(), 6);
        assert_eq!(cursor.remaining(), 2);

        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u48(), Ok(0x0102_0304_0506));
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u64(), Ok(0x0102_0304_0506_0708));
    }

    #[test]
    fn test_signed_reads() {
        let mut cursor = ByteCursor::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(cursor.read_i32(), Ok(-1));
        assert_eq!(cursor.read_i8(), Ok(-2));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_truncation_does_not_advance() {
        let mut cursor = ByteCursor::new(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(cursor.read_u32(), Err(DecodeError::Truncated { needed: 4, remaining: 3 }));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.take(3), Ok(&[0xAA, 0xBB, 0xCC][..]));
        assert_eq!(cursor.read_u8(), Err(DecodeError::Truncated { needed: 1, remaining: 0 }));
    }
}
