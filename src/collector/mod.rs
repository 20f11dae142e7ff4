// src/collector/mod.rs

//! The GHS collector: per-device protocol state behind one owner.

mod config;
mod event;

pub use config::CollectorConfig;
pub use event::{Channel, GhsEvent};

use crate::common::{
    address::DeviceAddress,
    command::{RacpCommand, RecordFilter},
    error::GhsError,
    hal_traits::{Characteristic, GhsTransport},
    response::parse_racp_response,
};
use crate::observation::ObservationCodec;
use crate::racp::RacpSession;
use crate::reassembly::{
    FrameOutcome, FrameReassembler, InvalidSegmentReason, SegmentOutcome, SegmentReassembler,
};

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use log::{debug, warn};

/// Stored observation messages start with the record number.
const RECORD_NUMBER_LEN: usize = 4;

/// Collects health observations from connected GHS sensors.
///
/// Feed every notification/indication to [`on_bytes_received`](Self::on_bytes_received)
/// and act on the returned events. RACP procedures are started with the
/// `request_*` / `retrieve_*` methods, which write through the transport.
#[derive(Debug)]
pub struct GhsCollector<T>
where
    T: GhsTransport,
{
    transport: T,
    config: CollectorConfig,
    codec: ObservationCodec,
    live_segments: SegmentReassembler,
    stored_segments: SegmentReassembler,
    frames: FrameReassembler,
    racp_sessions: BTreeMap<DeviceAddress, RacpSession>,
}

impl<T> GhsCollector<T>
where
    T: GhsTransport,
{
    pub fn new(transport: T, config: CollectorConfig) -> Self {
        GhsCollector {
            transport,
            config,
            codec: ObservationCodec::new(config.codec),
            live_segments: SegmentReassembler::new(),
            stored_segments: SegmentReassembler::new(),
            frames: FrameReassembler::new(),
            racp_sessions: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consumes the collector and returns the transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// RACP state for `address`, once a procedure or stored record has been seen.
    pub fn racp_session(&self, address: &DeviceAddress) -> Option<&RacpSession> {
        self.racp_sessions.get(address)
    }

    // --- Inbound ---

    /// Processes bytes received from `address` on `channel`.
    ///
    /// Never fails: every outcome, including framing and decode problems, is
    /// reported in the returned events.
    pub fn on_bytes_received(&mut self, address: DeviceAddress, channel: Channel, bytes: &[u8]) -> Vec<GhsEvent> {
        match channel {
            Channel::HealthObservations => self.on_live_segment(address, bytes),
            Channel::StoredHealthObservations => self.on_stored_segment(address, bytes),
            Channel::FramedObservations => self.on_frame_fragment(address, bytes),
            Channel::RecordAccessControlPoint => self.on_racp_indication(address, bytes),
        }
    }

    /// Drops every piece of state held for `address`.
    pub fn on_device_disconnected(&mut self, address: DeviceAddress) {
        debug!("dropping state for {}", address);
        self.live_segments.reset(&address);
        self.stored_segments.reset(&address);
        self.frames.reset(&address);
        self.racp_sessions.remove(&address);
    }

    fn on_live_segment(&mut self, address: DeviceAddress, bytes: &[u8]) -> Vec<GhsEvent> {
        match self.live_segments.push(address, bytes) {
            SegmentOutcome::Pending => Vec::new(),
            SegmentOutcome::Complete(message) => self.observations_event(address, &message),
            SegmentOutcome::Invalid(reason) => vec![invalid_segment(address, bytes, reason)],
        }
    }

    fn on_frame_fragment(&mut self, address: DeviceAddress, bytes: &[u8]) -> Vec<GhsEvent> {
        match self.frames.push(address, bytes) {
            FrameOutcome::Pending => Vec::new(),
            FrameOutcome::Complete(message) => self.observations_event(address, &message),
            FrameOutcome::Overflow(accumulated) => vec![GhsEvent::BytesOverflow { address, bytes: accumulated }],
            FrameOutcome::Invalid(reason) => vec![invalid_segment(address, bytes, reason)],
        }
    }

    fn on_stored_segment(&mut self, address: DeviceAddress, bytes: &[u8]) -> Vec<GhsEvent> {
        let message = match self.stored_segments.push(address, bytes) {
            SegmentOutcome::Pending => return Vec::new(),
            SegmentOutcome::Complete(message) => message,
            SegmentOutcome::Invalid(reason) => return vec![invalid_segment(address, bytes, reason)],
        };

        if message.len() < RECORD_NUMBER_LEN {
            warn!("stored record from {} shorter than its record number", address);
            return vec![invalid_segment(address, bytes, InvalidSegmentReason::Length)];
        }
        let (record_number, payload) = message.split_at(RECORD_NUMBER_LEN);
        let record_number = u32::from_le_bytes([record_number[0], record_number[1], record_number[2], record_number[3]]);

        self.racp_sessions.entry(address).or_default().record_received();

        let observations = self.codec.decode(payload);
        debug!("stored record {} from {}: {} observations", record_number, address, observations.len());
        observations
            .into_iter()
            .map(|observation| GhsEvent::StoredObservation { address, record_number, observation })
            .collect()
    }

    fn on_racp_indication(&mut self, address: DeviceAddress, bytes: &[u8]) -> Vec<GhsEvent> {
        let response = match parse_racp_response(bytes) {
            Ok(response) => response,
            Err(error) => {
                warn!("malformed RACP response from {}: {}", address, error);
                return vec![GhsEvent::MalformedRacpResponse { address, bytes: bytes.to_vec(), error }];
            }
        };

        let transition = self.racp_sessions.entry(address).or_default().handle_response(response);
        let mut events: Vec<GhsEvent> =
            transition.event.map(|event| GhsEvent::from_racp(address, event)).into_iter().collect();

        if let Some(command) = transition.follow_up {
            if self.send_command(address, command).is_err() {
                events.push(GhsEvent::CommandWriteFailed { address, op_code: command.op_code() as u8 });
            }
        }

        events
    }

    fn observations_event(&self, address: DeviceAddress, message: &[u8]) -> Vec<GhsEvent> {
        let observations = self.codec.decode(message);
        if observations.is_empty() {
            warn!("no observations decoded from {}-byte message from {}", message.len(), address);
        }
        vec![GhsEvent::Observations { address, observations }]
    }

    // --- Outbound RACP procedures ---

    /// Asks `address` how many stored records match `filter`.
    pub fn request_record_count(
        &mut self,
        address: DeviceAddress,
        filter: RecordFilter,
    ) -> Result<(), GhsError<T::Error>> {
        let command = self.racp_sessions.entry(address).or_default().request_record_count::<T::Error>(filter)?;
        self.send_command(address, command)
    }

    /// Retrieves the stored records matching `filter`: a count query followed
    /// by a combined report once the count arrives.
    pub fn retrieve_stored_records(
        &mut self,
        address: DeviceAddress,
        filter: RecordFilter,
    ) -> Result<(), GhsError<T::Error>> {
        let command = self.racp_sessions.entry(address).or_default().start_retrieval::<T::Error>(filter)?;
        self.send_command(address, command)
    }

    /// Requests the records matching `filter` without a count query.
    pub fn request_combined_report(
        &mut self,
        address: DeviceAddress,
        filter: RecordFilter,
    ) -> Result<(), GhsError<T::Error>> {
        let command = self.racp_sessions.entry(address).or_default().request_combined_report::<T::Error>(filter)?;
        self.send_command(address, command)
    }

    pub fn delete_stored_records(
        &mut self,
        address: DeviceAddress,
        filter: RecordFilter,
    ) -> Result<(), GhsError<T::Error>> {
        let command = self.racp_sessions.entry(address).or_default().delete_records::<T::Error>(filter)?;
        self.send_command(address, command)
    }

    /// Aborts the procedure in progress on `address`.
    pub fn abort_procedure(&mut self, address: DeviceAddress) -> Result<(), GhsError<T::Error>> {
        let command = self.racp_sessions.entry(address).or_default().abort();
        self.send_command(address, command)
    }

    /// Encodes and writes `command`; a failed write returns the session to idle.
    fn send_command(&mut self, address: DeviceAddress, command: RacpCommand) -> Result<(), GhsError<T::Error>> {
        let result = self.write_command(address, command);
        if let Err(error) = &result {
            warn!("writing RACP {} to {} failed: {:?}", command, address, error);
            if let Some(session) = self.racp_sessions.get_mut(&address) {
                session.reset();
            }
        }
        result
    }

    fn write_command(&mut self, address: DeviceAddress, command: RacpCommand) -> Result<(), GhsError<T::Error>> {
        let buffer = if self.config.racp_e2e_crc {
            command.format_with_e2e_crc::<T::Error>()?
        } else {
            command.format_into::<T::Error>()?
        };
        debug!("writing RACP {} to {}", command, address);
        nb::block!(self.transport.write_characteristic(&address, Characteristic::RecordAccessControlPoint, &buffer))
            .map_err(GhsError::Io)
    }
}

fn invalid_segment(address: DeviceAddress, bytes: &[u8], reason: InvalidSegmentReason) -> GhsEvent {
    GhsEvent::InvalidSegment { address, bytes: bytes.to_vec(), reason }
}
