// src/observation/attribute.rs

//! Decoder for flat attribute-list messages.
//!
//! Each attribute is `[id u32][length u16][value]`, big-endian. A handle
//! attribute opens a new observation; the attributes after it fill it in.

use super::cursor::ByteCursor;
use super::error::DecodeError;
use super::{Observation, ObservationValue};
use crate::common::types::{ObservationType, UnitCode};

use alloc::vec::Vec;
use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, warn};

// --- Attribute ids ---
pub(crate) const ATTR_HANDLE: u32 = 0x0001_0921;
pub(crate) const ATTR_TYPE: u32 = 0x0001_092F;
pub(crate) const ATTR_SIMPLE_NUMERIC: u32 = 0x0001_0A56;
pub(crate) const ATTR_UNIT: u32 = 0x0001_0996;
pub(crate) const ATTR_ABSOLUTE_TIME: u32 = 0x0001_0990;

/// Fields gathered for the observation currently being assembled.
#[derive(Debug, Default)]
struct PendingObservation {
    handle: Option<u16>,
    observation_type: ObservationType,
    value: Option<f32>,
    unit_code: UnitCode,
    timestamp: Option<DateTime<FixedOffset>>,
}

impl PendingObservation {
    fn finish(self) -> Option<Observation> {
        let Some(value) = self.value else {
            warn!("dropping observation {:?} without a value", self.handle);
            return None;
        };
        let mut observation = Observation::new(
            self.observation_type,
            self.unit_code,
            ObservationValue::SimpleNumeric { value, accuracy: None },
        );
        observation.handle = self.handle;
        observation.timestamp = self.timestamp;
        Some(observation)
    }

    fn apply(&mut self, id: u32, value: &[u8]) -> Result<(), DecodeError> {
        let mut cursor = ByteCursor::new(value);
        match id {
            ATTR_TYPE => self.observation_type = ObservationType(cursor.read_u32()?),
            ATTR_SIMPLE_NUMERIC => self.value = Some(cursor.read_mder()?.as_f32()),
            ATTR_UNIT => self.unit_code = UnitCode(cursor.read_u32()?),
            ATTR_ABSOLUTE_TIME => {
                let millis = i64::try_from(cursor.read_u64()?).map_err(|_| DecodeError::TimestampOutOfRange)?;
                let timestamp =
                    DateTime::<Utc>::from_timestamp_millis(millis).ok_or(DecodeError::TimestampOutOfRange)?;
                self.timestamp = Some(timestamp.fixed_offset());
            }
            other => debug!("skipping attribute {:#010x} ({} bytes)", other, value.len()),
        }
        Ok(())
    }
}

/// Decodes every observation of an attribute-list message.
pub(crate) fn decode_attribute_list(bytes: &[u8]) -> Vec<Observation> {
    let mut cursor = ByteCursor::new(bytes);
    let mut observations = Vec::new();
    let mut pending: Option<PendingObservation> = None;

    while !cursor.is_empty() {
        let attribute = cursor.read_u32().and_then(|id| {
            let length = cursor.read_u16()?;
            cursor.take(usize::from(length)).map(|value| (id, value))
        });
        let (id, value) = match attribute {
            Ok(attribute) => attribute,
            Err(error) => {
                warn!("stopping attribute decode at offset {}: {}", cursor.position(), error);
                break;
            }
        };

        if id == ATTR_HANDLE {
            observations.extend(pending.take().and_then(PendingObservation::finish));
            let handle = ByteCursor::new(value).read_u16();
            if let Err(error) = handle {
                warn!("malformed handle attribute: {}", error);
            }
            pending = Some(PendingObservation { handle: handle.ok(), ..PendingObservation::default() });
            continue;
        }

        let current = pending.get_or_insert_with(PendingObservation::default);
        if let Err(error) = current.apply(id, value) {
            warn!("ignoring malformed attribute {:#010x}: {}", id, error);
        }
    }

    observations.extend(pending.and_then(PendingObservation::finish));
    observations
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn attribute(id: u32, value: &[u8]) -> Vec<u8> {
        let mut bytes = id.to_be_bytes().to_vec();
        bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        bytes.extend_from_slice(value);
        bytes
    }

    fn oral_temperature(handle: u16) -> Vec<u8> {
        let mut bytes = attribute(ATTR_HANDLE, &handle.to_be_bytes());
        bytes.extend(attribute(ATTR_TYPE, &ObservationType::ORAL_TEMPERATURE.0.to_be_bytes()));
        bytes.extend(attribute(ATTR_SIMPLE_NUMERIC, &[0xFF, 0x00, 0x01, 0x7A]));
        bytes.extend(attribute(ATTR_UNIT, &UnitCode::CELSIUS.0.to_be_bytes()));
        bytes.extend(attribute(ATTR_ABSOLUTE_TIME, &[0x00, 0x00, 0x01, 0x76, 0x24, 0x1E, 0xE8, 0x82]));
        bytes
    }

    #[test]
    fn test_two_oral_temperatures() {
        let mut bytes = oral_temperature(1);
        bytes.extend(oral_temperature(2));
        assert_eq!(bytes.len(), 104);

        let observations = decode_attribute_list(&bytes);
        assert_eq!(observations.len(), 2);
        for (index, observation) in observations.iter().enumerate() {
            assert_eq!(observation.handle(), Some(index as u16 + 1));
            assert_eq!(observation.observation_type(), ObservationType::ORAL_TEMPERATURE);
            assert_eq!(observation.unit_code(), UnitCode::CELSIUS);
            assert!((observation.value().as_f32().unwrap() - 37.8).abs() < 1e-4);
            let timestamp = observation.timestamp().unwrap();
            assert_eq!(timestamp.timestamp_millis(), 0x0176_241E_E882);
            assert_eq!((timestamp.year(), timestamp.month(), timestamp.day()), (2020, 12, 2));
            assert_eq!(timestamp.offset().local_minus_utc(), 0);
        }
    }

    #[test]
    fn test_unknown_attributes_are_skipped() {
        let mut bytes = attribute(ATTR_HANDLE, &[0x00, 0x05]);
        bytes.extend(attribute(0x0001_0A4B, &[0xDE, 0xAD, 0xBE]));
        bytes.extend(attribute(ATTR_SIMPLE_NUMERIC, &[0x00, 0x00, 0x00, 0x48]));
        let observations = decode_attribute_list(&bytes);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value().as_f32(), Some(72.0));
        assert_eq!(observations[0].observation_type(), ObservationType::UNKNOWN);
    }

    #[test]
    fn test_observation_without_value_is_dropped() {
        let mut bytes = attribute(ATTR_HANDLE, &[0x00, 0x01]);
        bytes.extend(attribute(ATTR_TYPE, &ObservationType::HEART_RATE.0.to_be_bytes()));
        bytes.extend(oral_temperature(2));
        let observations = decode_attribute_list(&bytes);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].handle(), Some(2));
    }

    #[test]
    fn test_truncated_attribute_stops_decoding() {
        let mut bytes = oral_temperature(1);
        bytes.extend(oral_temperature(2));
        bytes.truncate(52 + 20);
        let observations = decode_attribute_list(&bytes);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].handle(), Some(1));
    }
}
