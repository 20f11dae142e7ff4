// src/common/types.rs

use core::fmt;

// --- MDER FLOAT ---

/// A 32-bit MDER FLOAT: signed 8-bit exponent (high octet) and signed 24-bit
/// mantissa, value = mantissa * 10^exponent.
///
/// Five mantissa patterns at exponent 0 are reserved and map to the IEEE
/// special values below.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct MderFloat(f32);

impl MderFloat {
    /// `+INFINITY`
    pub const RAW_POSITIVE_INFINITY: u32 = 0x007F_FFFE;
    /// `NaN` (not a number)
    pub const RAW_NAN: u32 = 0x007F_FFFF;
    /// `NRes` (not at this resolution), decoded as NaN
    pub const RAW_NRES: u32 = 0x0080_0000;
    /// Reserved for future use, decoded as NaN
    pub const RAW_RESERVED: u32 = 0x0080_0001;
    /// `-INFINITY`
    pub const RAW_NEGATIVE_INFINITY: u32 = 0x0080_0002;

    /// Decodes a raw 32-bit MDER value.
    pub fn from_raw(raw: u32) -> Self {
        let value = match raw {
            Self::RAW_POSITIVE_INFINITY => f32::INFINITY,
            Self::RAW_NAN | Self::RAW_NRES | Self::RAW_RESERVED => f32::NAN,
            Self::RAW_NEGATIVE_INFINITY => f32::NEG_INFINITY,
            _ => {
                let exponent = (raw >> 24) as u8 as i8;
                // Sign-extend the low 24 bits.
                let mantissa = ((raw << 8) as i32) >> 8;
                scale_by_power_of_ten(mantissa as f64, exponent) as f32
            }
        };
        MderFloat(value)
    }

    /// Decodes four bytes in wire order (most significant first).
    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self::from_raw(u32::from_be_bytes(bytes))
    }

    /// Returns the value as f32.
    #[inline]
    pub fn as_f32(&self) -> f32 {
        self.0
    }

    /// Returns true for the reserved infinity / NaN encodings.
    #[inline]
    pub fn is_special(&self) -> bool {
        !self.0.is_finite()
    }
}

impl From<MderFloat> for f32 {
    fn from(value: MderFloat) -> Self {
        value.0
    }
}

// `f64::powi` is std-only; an i8 exponent is at most 128 steps.
fn scale_by_power_of_ten(value: f64, exponent: i8) -> f64 {
    let mut result = value;
    if exponent >= 0 {
        for _ in 0..exponent {
            result *= 10.0;
        }
    } else {
        for _ in 0..exponent.unsigned_abs() {
            result /= 10.0;
        }
    }
    result
}

// --- Observation Class (ACOM object type tag) ---

/// Wire-level type tag opening every ACOM observation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ObservationClass {
    Unknown = 0x00,
    SimpleNumeric = 0x01,
    SimpleDiscrete = 0x02,
    String = 0x03,
    RealTimeSampleArray = 0x04,
    CompoundDiscreteEvent = 0x05,
    CompoundState = 0x06,
    CompoundObservation = 0x07,
    TlvEncoded = 0x08,
    ObservationBundle = 0xFF,
}

impl ObservationClass {
    /// Maps a tag byte to its class; unassigned tags are `Unknown`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => ObservationClass::SimpleNumeric,
            0x02 => ObservationClass::SimpleDiscrete,
            0x03 => ObservationClass::String,
            0x04 => ObservationClass::RealTimeSampleArray,
            0x05 => ObservationClass::CompoundDiscreteEvent,
            0x06 => ObservationClass::CompoundState,
            0x07 => ObservationClass::CompoundObservation,
            0x08 => ObservationClass::TlvEncoded,
            0xFF => ObservationClass::ObservationBundle,
            _ => ObservationClass::Unknown,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

// --- MDC nomenclature codes ---

/// MDC code naming what an observation (or component) measures.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct ObservationType(pub u32);

impl ObservationType {
    pub const UNKNOWN: ObservationType = ObservationType(0);
    pub const ORAL_TEMPERATURE: ObservationType = ObservationType(0x0002_0E08);
    pub const BODY_TEMPERATURE: ObservationType = ObservationType(0x0002_E004);
    pub const HEART_RATE: ObservationType = ObservationType(0x0002_482A);
    pub const SPO2: ObservationType = ObservationType(0x0002_4BB8);
    pub const RESPIRATION_RATE: ObservationType = ObservationType(0x0002_5012);
    pub const BLOOD_PRESSURE: ObservationType = ObservationType(0x0002_4A04);
    pub const SYSTOLIC_PRESSURE: ObservationType = ObservationType(0x0002_4A05);
    pub const DIASTOLIC_PRESSURE: ObservationType = ObservationType(0x0002_4A06);
    pub const MEAN_ARTERIAL_PRESSURE: ObservationType = ObservationType(0x0002_4A07);
    pub const ECG_LEAD_I: ObservationType = ObservationType(0x0002_0101);

    /// Human-readable name for the codes this crate knows about.
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Self::ORAL_TEMPERATURE => "oral temperature",
            Self::BODY_TEMPERATURE => "body temperature",
            Self::HEART_RATE => "heart rate",
            Self::SPO2 => "SpO2",
            Self::RESPIRATION_RATE => "respiration rate",
            Self::BLOOD_PRESSURE => "blood pressure",
            Self::SYSTOLIC_PRESSURE => "systolic pressure",
            Self::DIASTOLIC_PRESSURE => "diastolic pressure",
            Self::MEAN_ARTERIAL_PRESSURE => "mean arterial pressure",
            Self::ECG_LEAD_I => "ECG lead I",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#010x})", name, self.0),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

/// MDC unit code attached to an observation value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct UnitCode(pub u32);

impl UnitCode {
    pub const DIMENSIONLESS: UnitCode = UnitCode(0x0004_0200);
    pub const PERCENT: UnitCode = UnitCode(0x0004_0220);
    pub const CELSIUS: UnitCode = UnitCode(0x0004_17A0);
    pub const BEATS_PER_MINUTE: UnitCode = UnitCode(0x0004_0AA0);
    pub const RESPIRATIONS_PER_MINUTE: UnitCode = UnitCode(0x0004_0AE0);
    pub const MILLIMETER_MERCURY: UnitCode = UnitCode(0x0004_0F20);
    pub const MILLIVOLT: UnitCode = UnitCode(0x0004_10B2);
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
