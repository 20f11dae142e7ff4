// src/observation/codec.rs

use super::attribute::decode_attribute_list;
use super::cursor::ByteCursor;
use super::error::DecodeError;
use super::header::{
    read_time_field, ObservationHeaderFlag, ObservationHeaderFlags, TimeField, OBSERVATION_HEADER_LEN,
};
use super::{Observation, ObservationComponent, ObservationValue, TlvEntry};
use crate::common::types::{ObservationClass, ObservationType, UnitCode};

use alloc::string::String;
use alloc::vec::Vec;
use chrono::{DateTime, FixedOffset};
use log::{debug, warn};

/// Default limit on nested observation bundles.
pub const DEFAULT_MAX_BUNDLE_DEPTH: u8 = 4;

/// Longest TLV value that still fits the 64-bit entry value.
const TLV_VALUE_MAX_LEN: u8 = 8;

/// Wire format of reassembled observation messages.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ObservationFormat {
    /// ACOM objects: class tag, length, header flags, class payload.
    #[default]
    Acom,
    /// Flat `[id u32][length u16][value]` attribute lists.
    AttributeList,
}

/// Decoder settings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CodecConfig {
    pub format: ObservationFormat,
    /// Bundles nested deeper than this fail to decode.
    pub max_bundle_depth: u8,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig { format: ObservationFormat::Acom, max_bundle_depth: DEFAULT_MAX_BUNDLE_DEPTH }
    }
}

impl CodecConfig {
    #[must_use]
    pub fn with_format(mut self, format: ObservationFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_max_bundle_depth(mut self, depth: u8) -> Self {
        self.max_bundle_depth = depth;
        self
    }
}

// --- Internal Structures ---

/// One observation's header, with the body bounded by its declared length.
struct RawObservation<'a> {
    class_tag: u8,
    flags: ObservationHeaderFlags,
    body: &'a [u8],
}

/// Optional header fields, in wire order.
#[derive(Debug, Default)]
struct HeaderFields {
    observation_type: ObservationType,
    timestamp: Option<DateTime<FixedOffset>>,
    time_counter: Option<u64>,
    measurement_duration: Option<f32>,
    measurement_status: Option<u16>,
    object_id: Option<i32>,
    patient_id: Option<u16>,
    supplemental_info: Option<Vec<u32>>,
}

impl HeaderFields {
    fn into_observation(self, unit_code: UnitCode, value: ObservationValue) -> Observation {
        Observation {
            handle: None,
            observation_type: self.observation_type,
            timestamp: self.timestamp,
            time_counter: self.time_counter,
            measurement_duration: self.measurement_duration,
            measurement_status: self.measurement_status,
            patient_id: self.patient_id,
            object_id: self.object_id,
            unit_code,
            value,
            supplemental_info: self.supplemental_info,
            specialization_codes: None,
        }
    }
}

// --- Internal Helpers ---

/// Reads the fixed header and borrows the rest of the observation.
///
/// Any error here means the message structure is broken and decoding stops.
fn split_observation<'a>(cursor: &mut ByteCursor<'a>) -> Result<RawObservation<'a>, DecodeError> {
    let class_tag = cursor.read_u8()?;
    let declared = usize::from(cursor.read_u16()?);
    if declared < OBSERVATION_HEADER_LEN {
        return Err(DecodeError::InvalidLength);
    }
    let flags = ObservationHeaderFlags::from_bits(u32::from(cursor.read_u16()?));
    let body = cursor.take(declared - OBSERVATION_HEADER_LEN)?;
    Ok(RawObservation { class_tag, flags, body })
}

fn read_code_list(cursor: &mut ByteCursor<'_>) -> Result<Vec<u32>, DecodeError> {
    let count = cursor.read_u8()?;
    (0..count).map(|_| cursor.read_u32()).collect()
}

fn read_header_fields(
    cursor: &mut ByteCursor<'_>,
    flags: ObservationHeaderFlags,
) -> Result<HeaderFields, DecodeError> {
    let mut fields = HeaderFields::default();

    if flags.has_flag(ObservationHeaderFlag::ObservationType) {
        fields.observation_type = ObservationType(cursor.read_u32()?);
    }
    if flags.has_flag(ObservationHeaderFlag::Timestamp) {
        match read_time_field(cursor)? {
            TimeField::Calendar(timestamp) => fields.timestamp = Some(timestamp),
            TimeField::Ticks(ticks) => fields.time_counter = Some(ticks),
        }
    }
    if flags.has_flag(ObservationHeaderFlag::MeasurementDuration) {
        fields.measurement_duration = Some(cursor.read_mder()?.as_f32());
    }
    if flags.has_flag(ObservationHeaderFlag::MeasurementStatus) {
        fields.measurement_status = Some(cursor.read_u16()?);
    }
    if flags.has_flag(ObservationHeaderFlag::ObjectId) {
        fields.object_id = Some(cursor.read_i32()?);
    }
    if flags.has_flag(ObservationHeaderFlag::PatientId) {
        fields.patient_id = Some(cursor.read_u16()?);
    }
    if flags.has_flag(ObservationHeaderFlag::SupplementalInfo) {
        fields.supplemental_info = Some(read_code_list(cursor)?);
    }
    if flags.has_flag(ObservationHeaderFlag::DerivedFrom) {
        let references = read_code_list(cursor)?;
        debug!("observation derived from {:?}", references);
    }
    if flags.has_flag(ObservationHeaderFlag::HasMember) {
        return Err(DecodeError::Unsupported("has-member references"));
    }
    if flags.has_flag(ObservationHeaderFlag::Tlv) {
        return Err(DecodeError::Unsupported("TLV header fields"));
    }

    Ok(fields)
}

fn read_unit(cursor: &mut ByteCursor<'_>) -> Result<UnitCode, DecodeError> {
    cursor.read_u32().map(UnitCode)
}

/// `u16` length followed by that many bytes.
fn read_sized_bytes<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a [u8], DecodeError> {
    let length = cursor.read_u16()?;
    cursor.take(usize::from(length))
}

fn read_text(cursor: &mut ByteCursor<'_>) -> Result<String, DecodeError> {
    let bytes = read_sized_bytes(cursor)?;
    core::str::from_utf8(bytes).map(String::from).map_err(|_| DecodeError::InvalidUtf8)
}

fn read_tlv_entries(cursor: &mut ByteCursor<'_>) -> Result<Vec<TlvEntry>, DecodeError> {
    let count = cursor.read_u8()?;
    let mut entries = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let code = cursor.read_u32()?;
        let length = cursor.read_u8()?;
        if length > TLV_VALUE_MAX_LEN {
            return Err(DecodeError::TlvValueTooLong(length));
        }
        let value = cursor
            .take(usize::from(length))?
            .iter()
            .fold(0u64, |value, byte| (value << 8) | u64::from(*byte));
        entries.push(TlvEntry { code, value });
    }
    Ok(entries)
}

fn read_component_value(cursor: &mut ByteCursor<'_>, class_tag: u8) -> Result<ObservationValue, DecodeError> {
    let value = match ObservationClass::from_u8(class_tag) {
        ObservationClass::SimpleNumeric => {
            ObservationValue::SimpleNumeric { value: cursor.read_mder()?.as_f32(), accuracy: None }
        }
        ObservationClass::SimpleDiscrete => ObservationValue::Discrete(cursor.read_i32()?),
        ObservationClass::String => ObservationValue::Text(read_text(cursor)?),
        ObservationClass::RealTimeSampleArray => ObservationValue::SampleArray(read_sized_bytes(cursor)?.to_vec()),
        _ => return Err(DecodeError::UnsupportedComponentClass(class_tag)),
    };
    Ok(value)
}

// --- Codec ---

/// Decodes reassembled messages into [`Observation`]s.
#[derive(Debug, Clone, Default)]
pub struct ObservationCodec {
    config: CodecConfig,
}

impl ObservationCodec {
    pub fn new(config: CodecConfig) -> Self {
        ObservationCodec { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes every observation in `bytes` using the configured format.
    ///
    /// Never fails: observations that cannot be decoded are skipped, and a
    /// structurally broken message yields the observations decoded before the
    /// break.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Observation> {
        match self.config.format {
            ObservationFormat::Acom => self.decode_acom(bytes),
            ObservationFormat::AttributeList => decode_attribute_list(bytes),
        }
    }

    /// Decodes a sequence of ACOM observations.
    pub fn decode_acom(&self, bytes: &[u8]) -> Vec<Observation> {
        let mut cursor = ByteCursor::new(bytes);
        let mut observations = Vec::new();

        while !cursor.is_empty() {
            let offset = cursor.position();
            let raw = match split_observation(&mut cursor) {
                Ok(raw) => raw,
                Err(error) => {
                    warn!("stopping ACOM decode at offset {}: {}", offset, error);
                    break;
                }
            };
            match self.decode_raw(&raw, 0) {
                Ok(observation) => observations.push(observation),
                Err(error) => warn!("skipping observation at offset {}: {}", offset, error),
            }
        }

        observations
    }

    /// Decodes exactly one ACOM observation from the start of `bytes`.
    pub fn decode_observation(&self, bytes: &[u8]) -> Result<Observation, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let raw = split_observation(&mut cursor)?;
        self.decode_raw(&raw, 0)
    }

    fn decode_raw(&self, raw: &RawObservation<'_>, depth: u8) -> Result<Observation, DecodeError> {
        let mut cursor = ByteCursor::new(raw.body);
        let fields = read_header_fields(&mut cursor, raw.flags)?;

        let (unit_code, value) = match ObservationClass::from_u8(raw.class_tag) {
            ObservationClass::SimpleNumeric => {
                let unit = read_unit(&mut cursor)?;
                let value = cursor.read_mder()?.as_f32();
                let accuracy = if cursor.remaining() >= 4 { Some(cursor.read_mder()?.as_f32()) } else { None };
                (unit, ObservationValue::SimpleNumeric { value, accuracy })
            }
            ObservationClass::SimpleDiscrete => {
                let unit = read_unit(&mut cursor)?;
                (unit, ObservationValue::Discrete(cursor.read_i32()?))
            }
            ObservationClass::String => (UnitCode::DIMENSIONLESS, ObservationValue::Text(read_text(&mut cursor)?)),
            ObservationClass::RealTimeSampleArray => {
                let unit = read_unit(&mut cursor)?;
                (unit, ObservationValue::SampleArray(read_sized_bytes(&mut cursor)?.to_vec()))
            }
            ObservationClass::CompoundDiscreteEvent => {
                let unit = read_unit(&mut cursor)?;
                (unit, ObservationValue::CompoundDiscreteEvent(read_code_list(&mut cursor)?))
            }
            ObservationClass::CompoundState => {
                let size = usize::from(cursor.read_u8()?);
                let supported = cursor.take(size)?.to_vec();
                let state_or_event = cursor.take(size)?.to_vec();
                let value = cursor.take(size)?.to_vec();
                (UnitCode::DIMENSIONLESS, ObservationValue::CompoundState { supported, state_or_event, value })
            }
            ObservationClass::CompoundObservation => {
                let unit = read_unit(&mut cursor)?;
                let count = cursor.read_u8()?;
                let mut components = Vec::with_capacity(usize::from(count));
                for _ in 0..count {
                    let component_type = ObservationType(cursor.read_u32()?);
                    let class_tag = cursor.read_u8()?;
                    let value = read_component_value(&mut cursor, class_tag)?;
                    components.push(ObservationComponent { component_type, value });
                }
                (unit, ObservationValue::Compound(components))
            }
            ObservationClass::TlvEncoded => (UnitCode::DIMENSIONLESS, ObservationValue::Tlv(read_tlv_entries(&mut cursor)?)),
            ObservationClass::ObservationBundle => {
                let members = self.decode_bundle_members(&mut cursor, depth, &fields)?;
                (UnitCode::DIMENSIONLESS, ObservationValue::Bundled(members))
            }
            ObservationClass::Unknown => return Err(DecodeError::UnknownClass(raw.class_tag)),
        };

        Ok(fields.into_observation(unit_code, value))
    }

    /// Decodes the members of a bundle found at `depth` and hands them the
    /// bundle's timestamp, patient id and object id where they have none.
    fn decode_bundle_members(
        &self,
        cursor: &mut ByteCursor<'_>,
        depth: u8,
        bundle: &HeaderFields,
    ) -> Result<Vec<Observation>, DecodeError> {
        if depth >= self.config.max_bundle_depth {
            return Err(DecodeError::BundleTooDeep);
        }

        let count = cursor.read_u8()?;
        let mut members = Vec::with_capacity(usize::from(count));
        for index in 0..count {
            let raw = split_observation(cursor)?;
            match self.decode_raw(&raw, depth + 1) {
                Ok(member) => members.push(member),
                Err(error) => warn!("skipping bundle member {}: {}", index, error),
            }
        }

        for member in members.iter_mut() {
            member.inherit_from_bundle(bundle.timestamp, bundle.patient_id, bundle.object_id);
        }
        Ok(members)
    }
}
