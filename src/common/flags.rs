// src/common/flags.rs

use core::fmt;
use core::marker::PhantomData;

/// A named bit inside a [`FlagSet`].
///
/// Implemented by the small enums that describe the presence/mode bits of the
/// GHS wire format (observation header flags, timestamp flags, frame markers).
pub trait FlagBit: Copy {
    /// Bit position of this flag, `0` being the least significant bit.
    fn position(self) -> u32;
}

/// Immutable bitmask over an ordered set of named bits.
///
/// All operations return a new value; the set itself is `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagSet<F> {
    bits: u32,
    _marker: PhantomData<F>,
}

impl<F: FlagBit> FlagSet<F> {
    /// A set with no flags raised.
    pub const fn empty() -> Self {
        FlagSet { bits: 0, _marker: PhantomData }
    }

    /// Wraps a raw bit-vector as read from the wire.
    pub const fn from_bits(bits: u32) -> Self {
        FlagSet { bits, _marker: PhantomData }
    }

    /// Returns the raw bit-vector.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns `true` if `flag` is raised.
    ///
    /// An all-zero vector never reports any flag, including the one at bit 0.
    #[inline]
    pub fn has_flag(&self, flag: F) -> bool {
        self.bits != 0 && self.bits & Self::mask(flag) != 0
    }

    /// Returns a copy with `flag` raised.
    #[must_use]
    pub fn with(self, flag: F) -> Self {
        Self::from_bits(self.bits | Self::mask(flag))
    }

    /// Returns a copy with `flag` cleared.
    #[must_use]
    pub fn without(self, flag: F) -> Self {
        Self::from_bits(self.bits & !Self::mask(flag))
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::from_bits(self.bits | other.bits)
    }

    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self::from_bits(self.bits & other.bits)
    }

    #[inline]
    fn mask(flag: F) -> u32 {
        1u32.checked_shl(flag.position()).unwrap_or(0)
    }
}

impl<F: FlagBit> Default for FlagSet<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: FlagBit> FromIterator<F> for FlagSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, flag| set.with(flag))
    }
}

impl<F> fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagSet({:#06x})", self.bits)
    }
}
