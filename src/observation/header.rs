// src/observation/header.rs

use super::cursor::ByteCursor;
use super::error::DecodeError;
use crate::common::{
    flags::{FlagBit, FlagSet},
    timing::{
        offset_seconds, HUNDREDTHS_MICROSECONDS_SCALE, MILLISECONDS_SCALE, OFFSET_UNKNOWN, SECONDS_SCALE,
        Y2K_EPOCH_OFFSET_MS,
    },
};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::warn;

/// Class tag, declared length and header flags.
pub(crate) const OBSERVATION_HEADER_LEN: usize = 5;

// --- Observation header flags ---

/// Presence bits of the 16-bit observation header.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObservationHeaderFlag {
    ObservationType,
    Timestamp,
    MeasurementDuration,
    MeasurementStatus,
    ObjectId,
    PatientId,
    SupplementalInfo,
    DerivedFrom,
    HasMember,
    Tlv,
}

impl FlagBit for ObservationHeaderFlag {
    fn position(self) -> u32 {
        match self {
            ObservationHeaderFlag::ObservationType => 0,
            ObservationHeaderFlag::Timestamp => 1,
            ObservationHeaderFlag::MeasurementDuration => 2,
            ObservationHeaderFlag::MeasurementStatus => 3,
            ObservationHeaderFlag::ObjectId => 4,
            ObservationHeaderFlag::PatientId => 5,
            ObservationHeaderFlag::SupplementalInfo => 6,
            ObservationHeaderFlag::DerivedFrom => 7,
            ObservationHeaderFlag::HasMember => 8,
            ObservationHeaderFlag::Tlv => 9,
        }
    }
}

pub type ObservationHeaderFlags = FlagSet<ObservationHeaderFlag>;

// --- Timestamp flags ---

/// Bits of the 1-byte flags field opening an ACOM timestamp.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TimestampFlag {
    TickCounter,
    Utc,
    Milliseconds,
    HundredthsMicroseconds,
    TimeZone,
    DaylightSaving,
    CurrentTimeline,
}

impl FlagBit for TimestampFlag {
    fn position(self) -> u32 {
        match self {
            TimestampFlag::TickCounter => 0,
            TimestampFlag::Utc => 1,
            TimestampFlag::Milliseconds => 2,
            TimestampFlag::HundredthsMicroseconds => 3,
            TimestampFlag::TimeZone => 4,
            TimestampFlag::DaylightSaving => 5,
            TimestampFlag::CurrentTimeline => 6,
        }
    }
}

pub type TimestampFlags = FlagSet<TimestampFlag>;

/// A decoded timestamp field: either wall-clock time or a relative counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TimeField {
    Calendar(DateTime<FixedOffset>),
    Ticks(u64),
}

/// Reads a timestamp field at the cursor.
///
/// Layout: flags (1), then either a 48-bit tick counter, or a 48-bit time
/// value, a sync source byte (ignored) and a signed offset in 15 minute units.
pub(crate) fn read_time_field(cursor: &mut ByteCursor<'_>) -> Result<TimeField, DecodeError> {
    let flags = TimestampFlags::from_bits(u32::from(cursor.read_u8()?));

    if flags.has_flag(TimestampFlag::TickCounter) {
        return cursor.read_u48().map(TimeField::Ticks);
    }

    let time_value = cursor.read_u48()?;
    let _sync_source = cursor.read_u8()?;
    let offset_units = cursor.read_i8()?;
    calendar_timestamp(flags, time_value, offset_units).map(TimeField::Calendar)
}

/// Converts a time value counted from 2000-01-01 into a calendar timestamp.
///
/// An unknown (`-128`) or unrepresentable offset leaves the timestamp in UTC.
pub(crate) fn calendar_timestamp(
    flags: TimestampFlags,
    time_value: u64,
    offset_units: i8,
) -> Result<DateTime<FixedOffset>, DecodeError> {
    let scale = if flags.has_flag(TimestampFlag::Milliseconds) {
        MILLISECONDS_SCALE
    } else if flags.has_flag(TimestampFlag::HundredthsMicroseconds) {
        HUNDREDTHS_MICROSECONDS_SCALE
    } else {
        SECONDS_SCALE
    };

    let epoch_millis = i64::try_from(time_value)
        .ok()
        .and_then(|value| value.checked_mul(scale))
        .and_then(|millis| millis.checked_add(Y2K_EPOCH_OFFSET_MS))
        .ok_or(DecodeError::TimestampOutOfRange)?;
    let utc = DateTime::<Utc>::from_timestamp_millis(epoch_millis).ok_or(DecodeError::TimestampOutOfRange)?;

    let zoned = flags.has_flag(TimestampFlag::TimeZone) || flags.has_flag(TimestampFlag::DaylightSaving);
    let offset_secs = if zoned && offset_units != OFFSET_UNKNOWN { offset_seconds(offset_units) } else { 0 };
    let offset = match FixedOffset::east_opt(offset_secs) {
        Some(offset) => offset,
        None => {
            warn!("timestamp offset of {} quarter hours is out of range, keeping UTC", offset_units);
            Utc.fix()
        }
    };

    Ok(utc.with_timezone(&offset))
}
