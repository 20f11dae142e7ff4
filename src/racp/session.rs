// src/racp/session.rs

use crate::common::{
    command::{RacpCommand, RacpOpCode, RecordFilter},
    error::GhsError,
    response::{RacpResponse, RacpResponseCode},
};

use core::fmt::Debug;
use log::{debug, warn};

/// Where a device's RACP procedure stands.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum RacpState {
    #[default]
    Idle,
    AwaitingCount,
    AwaitingRecords,
    AwaitingDelete,
    AwaitingAbort,
}

impl RacpState {
    /// Op code of the request the session is waiting on, if any.
    pub fn pending_op_code(self) -> Option<RacpOpCode> {
        match self {
            RacpState::Idle => None,
            RacpState::AwaitingCount => Some(RacpOpCode::ReportNumberOfStoredRecords),
            RacpState::AwaitingRecords => Some(RacpOpCode::CombinedReport),
            RacpState::AwaitingDelete => Some(RacpOpCode::DeleteStoredRecords),
            RacpState::AwaitingAbort => Some(RacpOpCode::Abort),
        }
    }
}

/// Outcome of a RACP response, as seen by the application.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RacpEvent {
    /// Number of stored records matching the filter.
    RecordCount { count: u16 },
    /// A retrieval ended. `requested` comes from the count query (0 when the
    /// report was requested directly), `retrieved` counts the stored records
    /// received, `reported` is the server's own count.
    RetrievalComplete { requested: u16, retrieved: u32, reported: u16 },
    AbortCompleted,
    AbortError { code: RacpResponseCode },
    RecordsDeleted,
    /// The server answered a request with a non-success response code.
    ProcedureFailed { op_code: u8, code: RacpResponseCode },
}

/// What a response produced: an event to report and possibly a command the
/// session wants written next.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct RacpTransition {
    pub event: Option<RacpEvent>,
    pub follow_up: Option<RacpCommand>,
}

impl RacpTransition {
    fn event(event: RacpEvent) -> Self {
        RacpTransition { event: Some(event), follow_up: None }
    }
}

/// Client side of the Record Access Control Point for one device.
#[derive(Debug, Clone, Default)]
pub struct RacpSession {
    state: RacpState,
    is_retrieving: bool,
    records_to_retrieve: u16,
    records_retrieved: u32,
    filter: RecordFilter,
}

impl RacpSession {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Accessors ---

    pub fn state(&self) -> RacpState {
        self.state
    }

    pub fn is_retrieving(&self) -> bool {
        self.is_retrieving
    }

    pub fn records_to_retrieve(&self) -> u16 {
        self.records_to_retrieve
    }

    pub fn records_retrieved(&self) -> u32 {
        self.records_retrieved
    }

    pub fn filter(&self) -> RecordFilter {
        self.filter
    }

    // --- Starting procedures ---

    /// Starts a count query that only reports the number of records.
    pub fn request_record_count<E: Debug>(&mut self, filter: RecordFilter) -> Result<RacpCommand, GhsError<E>> {
        self.ensure_idle::<E>()?;
        self.start(RacpState::AwaitingCount, false, filter);
        Ok(RacpCommand::NumberOfStoredRecords { filter })
    }

    /// Starts a retrieval: count query first, then a combined report once the
    /// count is known.
    pub fn start_retrieval<E: Debug>(&mut self, filter: RecordFilter) -> Result<RacpCommand, GhsError<E>> {
        self.ensure_idle::<E>()?;
        self.start(RacpState::AwaitingCount, true, filter);
        Ok(RacpCommand::NumberOfStoredRecords { filter })
    }

    /// Requests the records directly, without a count query.
    pub fn request_combined_report<E: Debug>(&mut self, filter: RecordFilter) -> Result<RacpCommand, GhsError<E>> {
        self.ensure_idle::<E>()?;
        self.start(RacpState::AwaitingRecords, true, filter);
        Ok(RacpCommand::CombinedReport { filter })
    }

    pub fn delete_records<E: Debug>(&mut self, filter: RecordFilter) -> Result<RacpCommand, GhsError<E>> {
        self.ensure_idle::<E>()?;
        self.start(RacpState::AwaitingDelete, false, filter);
        Ok(RacpCommand::DeleteStoredRecords { filter })
    }

    /// Aborts whatever is in progress. Accepted in every state.
    pub fn abort(&mut self) -> RacpCommand {
        self.state = RacpState::AwaitingAbort;
        RacpCommand::Abort
    }

    /// Counts one stored record received during a retrieval.
    pub fn record_received(&mut self) {
        if !self.is_retrieving {
            debug!("stored record received outside a retrieval");
        }
        self.records_retrieved = self.records_retrieved.saturating_add(1);
    }

    /// Returns to `Idle` and clears the counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn ensure_idle<E: Debug>(&self) -> Result<(), GhsError<E>> {
        match self.state.pending_op_code() {
            Some(op_code) => Err(GhsError::ProcedureInProgress { opcode: op_code as u8 }),
            None => Ok(()),
        }
    }

    fn start(&mut self, state: RacpState, retrieving: bool, filter: RecordFilter) {
        self.state = state;
        self.is_retrieving = retrieving;
        self.records_to_retrieve = 0;
        self.records_retrieved = 0;
        self.filter = filter;
    }

    // --- Responses ---

    /// Applies a parsed response and reports what it means.
    pub fn handle_response(&mut self, response: RacpResponse) -> RacpTransition {
        match response {
            RacpResponse::NumberOfRecords { count } => self.on_record_count(count),
            RacpResponse::CombinedReport { count } => {
                if self.state != RacpState::AwaitingRecords {
                    warn!("combined report response in state {:?}", self.state);
                }
                let event = self.complete_retrieval(count);
                RacpTransition::event(event)
            }
            RacpResponse::ResponseCode { request_op_code, code } => self.on_response_code(request_op_code, code),
        }
    }

    fn on_record_count(&mut self, count: u16) -> RacpTransition {
        if self.state != RacpState::AwaitingCount {
            warn!("record count response in state {:?}", self.state);
        }

        if self.is_retrieving && self.state == RacpState::AwaitingCount {
            self.records_to_retrieve = count;
            self.state = RacpState::AwaitingRecords;
            return RacpTransition {
                event: Some(RacpEvent::RecordCount { count }),
                follow_up: Some(RacpCommand::CombinedReport { filter: self.filter }),
            };
        }

        self.reset();
        RacpTransition::event(RacpEvent::RecordCount { count })
    }

    fn on_response_code(&mut self, request_op_code: u8, code: RacpResponseCode) -> RacpTransition {
        let event = match RacpOpCode::from_u8(request_op_code) {
            Some(RacpOpCode::Abort) => {
                if code.is_success() {
                    RacpEvent::AbortCompleted
                } else {
                    RacpEvent::AbortError { code }
                }
            }
            Some(RacpOpCode::CombinedReport | RacpOpCode::ReportStoredRecords)
                if code.is_success() || code == RacpResponseCode::NoRecordsFound =>
            {
                let reported = if code.is_success() { self.records_retrieved_u16() } else { 0 };
                self.complete_retrieval(reported)
            }
            Some(RacpOpCode::ReportNumberOfStoredRecords) if code == RacpResponseCode::NoRecordsFound => {
                if self.is_retrieving {
                    self.complete_retrieval(0)
                } else {
                    RacpEvent::RecordCount { count: 0 }
                }
            }
            Some(RacpOpCode::DeleteStoredRecords) if code.is_success() => RacpEvent::RecordsDeleted,
            _ => {
                warn!("RACP request {:#04x} failed: {}", request_op_code, code);
                RacpEvent::ProcedureFailed { op_code: request_op_code, code }
            }
        };

        self.reset();
        RacpTransition::event(event)
    }

    fn complete_retrieval(&mut self, reported: u16) -> RacpEvent {
        let event = RacpEvent::RetrievalComplete {
            requested: self.records_to_retrieve,
            retrieved: self.records_retrieved,
            reported,
        };
        debug!("retrieval complete: {:?}", event);
        self.reset();
        event
    }

    fn records_retrieved_u16(&self) -> u16 {
        u16::try_from(self.records_retrieved).unwrap_or(u16::MAX)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::response::parse_racp_response;

    fn respond(session: &mut RacpSession, bytes: &[u8]) -> RacpTransition {
        session.handle_response(parse_racp_response(bytes).unwrap())
    }

    #[test]
    fn test_count_only_query() {
        let mut session = RacpSession::new();
        let command = session.request_record_count::<()>(RecordFilter::All).unwrap();
        assert_eq!(command, RacpCommand::NumberOfStoredRecords { filter: RecordFilter::All });
        assert_eq!(session.state(), RacpState::AwaitingCount);
        assert!(!session.is_retrieving());

        let transition = respond(&mut session, &[0x05, 0x00, 0x03, 0x00]);
        assert_eq!(transition.event, Some(RacpEvent::RecordCount { count: 3 }));
        assert_eq!(transition.follow_up, None);
        assert_eq!(session.state(), RacpState::Idle);
    }

    #[test]
    fn test_full_retrieval() {
        let mut session = RacpSession::new();
        let filter = RecordFilter::FromRecordNumber(10);
        session.start_retrieval::<()>(filter).unwrap();
        assert!(session.is_retrieving());

        let transition = respond(&mut session, &[0x05, 0x00, 0x02, 0x00]);
        assert_eq!(transition.event, Some(RacpEvent::RecordCount { count: 2 }));
        assert_eq!(transition.follow_up, Some(RacpCommand::CombinedReport { filter }));
        assert_eq!(session.state(), RacpState::AwaitingRecords);
        assert_eq!(session.records_to_retrieve(), 2);

        session.record_received();
        session.record_received();
        assert_eq!(session.records_retrieved(), 2);

        let transition = respond(&mut session, &[0x08, 0x00, 0x02, 0x00]);
        assert_eq!(
            transition.event,
            Some(RacpEvent::RetrievalComplete { requested: 2, retrieved: 2, reported: 2 })
        );
        assert_eq!(session.state(), RacpState::Idle);
        assert!(!session.is_retrieving());
        assert_eq!(session.records_retrieved(), 0);
        assert_eq!(session.filter(), RecordFilter::All);
    }

    #[test]
    fn test_no_records_found_ends_retrieval() {
        let mut session = RacpSession::new();
        session.request_combined_report::<()>(RecordFilter::All).unwrap();
        let transition = respond(&mut session, &[0x06, 0x00, 0x07, 0x06]);
        assert_eq!(
            transition.event,
            Some(RacpEvent::RetrievalComplete { requested: 0, retrieved: 0, reported: 0 })
        );
        assert_eq!(session.state(), RacpState::Idle);
    }

    #[test]
    fn test_abort_in_any_state() {
        let mut session = RacpSession::new();
        session.start_retrieval::<()>(RecordFilter::All).unwrap();
        respond(&mut session, &[0x05, 0x00, 0x09, 0x00]);
        session.record_received();

        assert_eq!(session.abort(), RacpCommand::Abort);
        assert_eq!(session.state(), RacpState::AwaitingAbort);
        let transition = respond(&mut session, &[0x06, 0x00, 0x03, 0x01]);
        assert_eq!(transition.event, Some(RacpEvent::AbortCompleted));
        assert_eq!(session.state(), RacpState::Idle);
        assert_eq!(session.records_retrieved(), 0);

        session.abort();
        let transition = respond(&mut session, &[0x06, 0x00, 0x03, 0x07]);
        assert_eq!(
            transition.event,
            Some(RacpEvent::AbortError { code: RacpResponseCode::AbortUnsuccessful })
        );
    }

    #[test]
    fn test_procedure_in_progress_is_rejected() {
        let mut session = RacpSession::new();
        session.request_record_count::<()>(RecordFilter::All).unwrap();
        assert!(matches!(
            session.delete_records::<()>(RecordFilter::All),
            Err(GhsError::ProcedureInProgress { opcode: 0x04 })
        ));
        assert!(matches!(
            session.request_combined_report::<()>(RecordFilter::All),
            Err(GhsError::ProcedureInProgress { opcode: 0x04 })
        ));
        assert_eq!(session.state(), RacpState::AwaitingCount);
    }

    #[test]
    fn test_delete_outcomes() {
        let mut session = RacpSession::new();
        session.delete_records::<()>(RecordFilter::All).unwrap();
        assert_eq!(session.state(), RacpState::AwaitingDelete);
        let transition = respond(&mut session, &[0x06, 0x00, 0x02, 0x01]);
        assert_eq!(transition.event, Some(RacpEvent::RecordsDeleted));

        session.delete_records::<()>(RecordFilter::FromRecordNumber(4)).unwrap();
        let transition = respond(&mut session, &[0x06, 0x00, 0x02, 0x04]);
        assert_eq!(
            transition.event,
            Some(RacpEvent::ProcedureFailed { op_code: 0x02, code: RacpResponseCode::OperatorNotSupported })
        );
        assert_eq!(session.state(), RacpState::Idle);
    }

    #[test]
    fn test_failed_count_query() {
        let mut session = RacpSession::new();
        session.start_retrieval::<()>(RecordFilter::All).unwrap();
        let transition = respond(&mut session, &[0x06, 0x00, 0x04, 0x02]);
        assert_eq!(
            transition.event,
            Some(RacpEvent::ProcedureFailed { op_code: 0x04, code: RacpResponseCode::OpCodeNotSupported })
        );
        assert_eq!(transition.follow_up, None);

        session.start_retrieval::<()>(RecordFilter::All).unwrap();
        let transition = respond(&mut session, &[0x06, 0x00, 0x04, 0x06]);
        assert_eq!(
            transition.event,
            Some(RacpEvent::RetrievalComplete { requested: 0, retrieved: 0, reported: 0 })
        );
    }

    #[test]
    fn test_unsolicited_count_is_still_reported() {
        let mut session = RacpSession::new();
        let transition = respond(&mut session, &[0x05, 0x00, 0x07, 0x00]);
        assert_eq!(transition.event, Some(RacpEvent::RecordCount { count: 7 }));
        assert_eq!(transition.follow_up, None);
        assert_eq!(session.state(), RacpState::Idle);
    }
}
