// src/collector/event.rs

use crate::common::{
    address::DeviceAddress,
    response::{RacpParseError, RacpResponseCode},
};
use crate::observation::Observation;
use crate::racp::RacpEvent;
use crate::reassembly::InvalidSegmentReason;

use alloc::vec::Vec;

/// Inbound characteristic a notification or indication arrived on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Channel {
    /// Live observations, segmented.
    HealthObservations,
    /// Stored observations, segmented; each message starts with a `u32`
    /// little-endian record number.
    StoredHealthObservations,
    /// Observations in length-prefixed frames.
    FramedObservations,
    /// RACP indications.
    RecordAccessControlPoint,
}

/// Everything the collector reports back from inbound bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum GhsEvent {
    /// Observations decoded from one live or framed message.
    Observations { address: DeviceAddress, observations: Vec<Observation> },
    /// A fragment was rejected; `bytes` is the fragment as received.
    InvalidSegment { address: DeviceAddress, bytes: Vec<u8>, reason: InvalidSegmentReason },
    /// A frame grew past its declared length; `bytes` is what had accumulated.
    BytesOverflow { address: DeviceAddress, bytes: Vec<u8> },
    RecordCount { address: DeviceAddress, count: u16 },
    /// One observation of a stored record.
    StoredObservation { address: DeviceAddress, record_number: u32, observation: Observation },
    RetrievalComplete { address: DeviceAddress, requested: u16, retrieved: u32, reported: u16 },
    AbortCompleted { address: DeviceAddress },
    AbortError { address: DeviceAddress, code: RacpResponseCode },
    RecordsDeleted { address: DeviceAddress },
    ProcedureFailed { address: DeviceAddress, op_code: u8, code: RacpResponseCode },
    MalformedRacpResponse { address: DeviceAddress, bytes: Vec<u8>, error: RacpParseError },
    /// A command the collector issued on its own (a follow-up report request)
    /// could not be written.
    CommandWriteFailed { address: DeviceAddress, op_code: u8 },
}

impl GhsEvent {
    pub(crate) fn from_racp(address: DeviceAddress, event: RacpEvent) -> Self {
        match event {
            RacpEvent::RecordCount { count } => GhsEvent::RecordCount { address, count },
            RacpEvent::RetrievalComplete { requested, retrieved, reported } => {
                GhsEvent::RetrievalComplete { address, requested, retrieved, reported }
            }
            RacpEvent::AbortCompleted => GhsEvent::AbortCompleted { address },
            RacpEvent::AbortError { code } => GhsEvent::AbortError { address, code },
            RacpEvent::RecordsDeleted => GhsEvent::RecordsDeleted { address },
            RacpEvent::ProcedureFailed { op_code, code } => GhsEvent::ProcedureFailed { address, op_code, code },
        }
    }

    /// Device the event concerns.
    pub fn address(&self) -> DeviceAddress {
        match self {
            GhsEvent::Observations { address, .. }
            | GhsEvent::InvalidSegment { address, .. }
            | GhsEvent::BytesOverflow { address, .. }
            | GhsEvent::RecordCount { address, .. }
            | GhsEvent::StoredObservation { address, .. }
            | GhsEvent::RetrievalComplete { address, .. }
            | GhsEvent::AbortCompleted { address }
            | GhsEvent::AbortError { address, .. }
            | GhsEvent::RecordsDeleted { address }
            | GhsEvent::ProcedureFailed { address, .. }
            | GhsEvent::MalformedRacpResponse { address, .. }
            | GhsEvent::CommandWriteFailed { address, .. } => *address,
        }
    }
}
