// src/observation/mod.rs

//! Health observations and the decoders that produce them.

mod attribute;
pub mod codec;
mod cursor;
pub mod error;
pub mod header;

pub use codec::{CodecConfig, ObservationCodec, ObservationFormat};
pub use error::DecodeError;
pub use header::{ObservationHeaderFlag, ObservationHeaderFlags, TimestampFlag, TimestampFlags};

use crate::common::types::{ObservationType, UnitCode};

use alloc::string::String;
use alloc::vec::Vec;
use chrono::{DateTime, FixedOffset};

/// The measured content of an observation, one variant per ACOM class.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationValue {
    SimpleNumeric { value: f32, accuracy: Option<f32> },
    /// Raw real-time sample array bytes, not scaled.
    SampleArray(Vec<u8>),
    Discrete(i32),
    Text(String),
    CompoundDiscreteEvent(Vec<u32>),
    CompoundState { supported: Vec<u8>, state_or_event: Vec<u8>, value: Vec<u8> },
    Compound(Vec<ObservationComponent>),
    Tlv(Vec<TlvEntry>),
    Bundled(Vec<Observation>),
}

impl ObservationValue {
    /// The numeric value for simple numeric observations.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ObservationValue::SimpleNumeric { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// One typed part of a compound observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationComponent {
    pub component_type: ObservationType,
    pub value: ObservationValue,
}

/// One entry of a TLV-encoded observation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TlvEntry {
    pub code: u32,
    pub value: u64,
}

/// A single health observation.
///
/// Built by the codec or through the `with_*` methods; read through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub(crate) handle: Option<u16>,
    pub(crate) observation_type: ObservationType,
    pub(crate) timestamp: Option<DateTime<FixedOffset>>,
    pub(crate) time_counter: Option<u64>,
    pub(crate) measurement_duration: Option<f32>,
    pub(crate) measurement_status: Option<u16>,
    pub(crate) patient_id: Option<u16>,
    pub(crate) object_id: Option<i32>,
    pub(crate) unit_code: UnitCode,
    pub(crate) value: ObservationValue,
    pub(crate) supplemental_info: Option<Vec<u32>>,
    pub(crate) specialization_codes: Option<Vec<u32>>,
}

impl Observation {
    pub fn new(observation_type: ObservationType, unit_code: UnitCode, value: ObservationValue) -> Self {
        Observation {
            handle: None,
            observation_type,
            timestamp: None,
            time_counter: None,
            measurement_duration: None,
            measurement_status: None,
            patient_id: None,
            object_id: None,
            unit_code,
            value,
            supplemental_info: None,
            specialization_codes: None,
        }
    }

    // --- Builders ---

    #[must_use]
    pub fn with_handle(mut self, handle: u16) -> Self {
        self.handle = Some(handle);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_time_counter(mut self, ticks: u64) -> Self {
        self.time_counter = Some(ticks);
        self
    }

    #[must_use]
    pub fn with_measurement_duration(mut self, seconds: f32) -> Self {
        self.measurement_duration = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_measurement_status(mut self, status: u16) -> Self {
        self.measurement_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_patient_id(mut self, patient_id: u16) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    #[must_use]
    pub fn with_object_id(mut self, object_id: i32) -> Self {
        self.object_id = Some(object_id);
        self
    }

    #[must_use]
    pub fn with_supplemental_info(mut self, codes: Vec<u32>) -> Self {
        self.supplemental_info = Some(codes);
        self
    }

    #[must_use]
    pub fn with_specialization_codes(mut self, codes: Vec<u32>) -> Self {
        self.specialization_codes = Some(codes);
        self
    }

    // --- Accessors ---

    pub fn handle(&self) -> Option<u16> {
        self.handle
    }

    pub fn observation_type(&self) -> ObservationType {
        self.observation_type
    }

    pub fn timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        self.timestamp.as_ref()
    }

    /// Relative time in device ticks, for observations stamped with a tick counter.
    pub fn time_counter(&self) -> Option<u64> {
        self.time_counter
    }

    pub fn measurement_duration(&self) -> Option<f32> {
        self.measurement_duration
    }

    pub fn measurement_status(&self) -> Option<u16> {
        self.measurement_status
    }

    pub fn patient_id(&self) -> Option<u16> {
        self.patient_id
    }

    pub fn object_id(&self) -> Option<i32> {
        self.object_id
    }

    pub fn unit_code(&self) -> UnitCode {
        self.unit_code
    }

    pub fn value(&self) -> &ObservationValue {
        &self.value
    }

    pub fn supplemental_info(&self) -> Option<&[u32]> {
        self.supplemental_info.as_deref()
    }

    pub fn specialization_codes(&self) -> Option<&[u32]> {
        self.specialization_codes.as_deref()
    }

    /// Member observations when this is a bundle, empty otherwise.
    pub fn members(&self) -> &[Observation] {
        match &self.value {
            ObservationValue::Bundled(members) => members,
            _ => &[],
        }
    }

    /// Copies the bundle-level timestamp, patient id and object id onto a
    /// member that does not carry its own.
    pub(crate) fn inherit_from_bundle(
        &mut self,
        timestamp: Option<DateTime<FixedOffset>>,
        patient_id: Option<u16>,
        object_id: Option<i32>,
    ) {
        if self.timestamp.is_none() {
            self.timestamp = timestamp;
        }
        if self.patient_id.is_none() {
            self.patient_id = patient_id;
        }
        if self.object_id.is_none() {
            self.object_id = object_id;
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_builder_sets_fields() {
        let observation = Observation::new(
            ObservationType::HEART_RATE,
            UnitCode::BEATS_PER_MINUTE,
            ObservationValue::SimpleNumeric { value: 72.0, accuracy: None },
        )
        .with_handle(3)
        .with_patient_id(9)
        .with_specialization_codes(vec![0x0008_4B00]);

        assert_eq!(observation.handle(), Some(3));
        assert_eq!(observation.patient_id(), Some(9));
        assert_eq!(observation.object_id(), None);
        assert_eq!(observation.value().as_f32(), Some(72.0));
        assert_eq!(observation.specialization_codes(), Some(&[0x0008_4B00][..]));
        assert!(observation.members().is_empty());
    }

    #[test]
    fn test_inherit_keeps_own_values() {
        let mut member = Observation::new(
            ObservationType::SPO2,
            UnitCode::PERCENT,
            ObservationValue::Discrete(97),
        )
        .with_patient_id(1);
        member.inherit_from_bundle(None, Some(2), Some(5));
        assert_eq!(member.patient_id(), Some(1));
        assert_eq!(member.object_id(), Some(5));
        assert_eq!(member.timestamp(), None);
    }
}
