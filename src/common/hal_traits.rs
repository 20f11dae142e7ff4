// src/common/hal_traits.rs

use super::address::DeviceAddress;
use core::fmt::Debug;

/// GATT characteristics the collector writes to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Characteristic {
    /// Record Access Control Point (0x2A52).
    RecordAccessControlPoint,
}

impl Characteristic {
    /// Assigned 16-bit UUID of the characteristic.
    pub const fn uuid16(self) -> u16 {
        match self {
            Characteristic::RecordAccessControlPoint => 0x2A52,
        }
    }
}

/// Abstraction over the Bluetooth stack that owns the connection.
///
/// The collector never scans, connects or enables notifications; it only needs
/// to push control point writes to an already connected peripheral.
pub trait GhsTransport {
    /// Associated error type for transport failures.
    type Error: Debug;

    /// Attempts to write `bytes` to `characteristic` on the peripheral at `address`.
    ///
    /// Returns `Ok(())` once the write was accepted, or `Err(nb::Error::WouldBlock)`
    /// if the stack cannot take it yet. Other errors are returned as
    /// `Err(nb::Error::Other(Self::Error))`.
    fn write_characteristic(
        &mut self,
        address: &DeviceAddress,
        characteristic: Characteristic,
        bytes: &[u8],
    ) -> nb::Result<(), Self::Error>;
}
