// src/common/timing.rs

// Constants for the time fields carried by ACOM observations.

/// Milliseconds between the Unix epoch and 2000-01-01T00:00:00Z, the epoch
/// ACOM time values count from.
pub const Y2K_EPOCH_OFFSET_MS: i64 = 946_684_800_000;

/// Size of one unit of the signed TZ/DST offset byte.
pub const OFFSET_UNIT_MINUTES: i32 = 15;

/// Offset byte value meaning the zone offset is not known.
pub const OFFSET_UNKNOWN: i8 = i8::MIN;

/// Scale applied to a time value flagged as milliseconds.
pub const MILLISECONDS_SCALE: i64 = 1;
/// Scale applied to a time value flagged as hundredths of microseconds.
pub const HUNDREDTHS_MICROSECONDS_SCALE: i64 = 10;
/// Scale applied to a time value with no resolution flag (seconds).
pub const SECONDS_SCALE: i64 = 1_000;

/// Converts the signed offset byte into seconds east of UTC.
#[inline]
pub const fn offset_seconds(offset_units: i8) -> i32 {
    offset_units as i32 * OFFSET_UNIT_MINUTES * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_seconds() {
        assert_eq!(offset_seconds(0), 0);
        assert_eq!(offset_seconds(4), 3600);
        assert_eq!(offset_seconds(-20), -18_000);
    }
}
