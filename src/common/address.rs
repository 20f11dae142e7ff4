// src/common/address.rs

use super::error::GhsError;
use core::convert::TryFrom;
use core::fmt;
use core::str::FromStr;

/// 48-bit Bluetooth device address identifying a GHS peripheral.
///
/// All per-device state in this crate (segment sessions, frame accumulators,
/// RACP sessions) is keyed by this value.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    /// Creates an address from its six octets, most significant first.
    pub const fn new(octets: [u8; 6]) -> Self {
        DeviceAddress(octets)
    }

    #[inline]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parses the textual `AA:BB:CC:DD:EE:FF` form (hex digits in either case).
    ///
    /// Returns `Result<Self, GhsError<()>>` because parsing cannot cause an I/O error.
    pub fn parse(text: &str) -> Result<Self, GhsError<()>> {
        let bytes = text.as_bytes();
        if bytes.len() != 17 {
            return Err(GhsError::InvalidAddress);
        }

        let mut octets = [0u8; 6];
        for (index, octet) in octets.iter_mut().enumerate() {
            let start = index * 3;
            if index > 0 && bytes[start - 1] != b':' {
                return Err(GhsError::InvalidAddress);
            }
            let high = hex_value(bytes[start]).ok_or(GhsError::InvalidAddress)?;
            let low = hex_value(bytes[start + 1]).ok_or(GhsError::InvalidAddress)?;
            *octet = (high << 4) | low;
        }

        Ok(DeviceAddress(octets))
    }
}

#[inline]
fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for DeviceAddress {
    type Err = GhsError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DeviceAddress {
    type Error = GhsError<()>;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<[u8; 6]> for DeviceAddress {
    fn from(value: [u8; 6]) -> Self {
        DeviceAddress(value)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String as HeaplessString;

    #[test]
    fn test_valid_addresses() {
        assert_eq!(
            DeviceAddress::parse("00:11:22:AA:BB:CC").unwrap(),
            DeviceAddress::new([0x00, 0x11, 0x22, 0xAA, 0xBB, 0xCC])
        );
        assert_eq!(
            DeviceAddress::parse("de:ad:be:ef:00:01").unwrap(),
            DeviceAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01])
        );
        assert!("Fa:0b:1C:d2:E3:44".parse::<DeviceAddress>().is_ok());
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(matches!(DeviceAddress::parse(""), Err(GhsError::InvalidAddress)));
        assert!(matches!(DeviceAddress::parse("00:11:22:33:44"), Err(GhsError::InvalidAddress)));
        assert!(matches!(DeviceAddress::parse("00-11-22-33-44-55"), Err(GhsError::InvalidAddress)));
        assert!(matches!(DeviceAddress::parse("00:11:22:33:44:5G"), Err(GhsError::InvalidAddress)));
        assert!(matches!(DeviceAddress::try_from("00:11:22:33:44:55:66"), Err(GhsError::InvalidAddress)));
    }

    #[test]
    fn test_display_is_upper_case() {
        let address = DeviceAddress::parse("0a:1b:2c:3d:4e:5f").unwrap();
        let mut text: HeaplessString<17> = HeaplessString::new();
        write!(text, "{}", address).unwrap();
        assert_eq!(text.as_str(), "0A:1B:2C:3D:4E:5F");
    }

    #[test]
    fn test_ordering_follows_octets() {
        let low = DeviceAddress::new([0, 0, 0, 0, 0, 1]);
        let high = DeviceAddress::new([0, 0, 0, 0, 1, 0]);
        assert!(low < high);
    }
}
