// src/common/crc.rs

use crc::{Algorithm, Crc};

/// E2E-CRC algorithm used by GHS control point writes (CRC-16/MCRF4XX).
/// Polynomial: 0x1021 (CRC-CCITT, D16+D12+D5+1)
/// Initial Value: 0xFFFF
/// Input Reflected: true (LSB first)
/// Output Reflected: true
/// Final XOR: 0x0000
/// Check Value: 0x6F91 (for "123456789")
pub const GHS_E2E_CRC: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0xFFFF,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0x6F91,
    residue: 0x0000,
};

const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&GHS_E2E_CRC);

/// Calculates the E2E-CRC over `data`.
#[inline]
pub fn calculate_e2e_crc(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Encodes a CRC value the way it trails a control point write (LSB first).
pub fn encode_e2e_crc(crc_value: u16) -> [u8; 2] {
    crc_value.to_le_bytes()
}

/// Splits `packet` into payload and trailing CRC and checks them against each other.
///
/// Inbound data is not verified by the collector; this helper exists for
/// applications that want to opt into the check themselves.
///
/// # Returns
///
/// * `Some(payload)` if the packet carries a matching CRC.
/// * `None` if the packet is shorter than the CRC or the values differ.
pub fn strip_e2e_crc(packet: &[u8]) -> Option<&[u8]> {
    let split = packet.len().checked_sub(2)?;
    let (payload, crc_bytes) = packet.split_at(split);
    let received = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    (calculate_e2e_crc(payload) == received).then_some(payload)
}
