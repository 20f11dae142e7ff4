// src/common/response/mod.rs

mod error;
pub mod parse;

pub use error::RacpParseError;
pub use parse::parse_racp_response;

use crate::common::command::RacpOpCode;
use core::fmt;

/// Result code carried by a RACP Response Code indication (`0x06`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RacpResponseCode {
    Success,
    OpCodeNotSupported,
    InvalidOperator,
    OperatorNotSupported,
    InvalidOperand,
    NoRecordsFound,
    AbortUnsuccessful,
    ProcedureNotCompleted,
    OperandNotSupported,
    /// A value this crate does not name, surfaced verbatim.
    Unknown(u8),
}

impl RacpResponseCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => RacpResponseCode::Success,
            0x02 => RacpResponseCode::OpCodeNotSupported,
            0x03 => RacpResponseCode::InvalidOperator,
            0x04 => RacpResponseCode::OperatorNotSupported,
            0x05 => RacpResponseCode::InvalidOperand,
            0x06 => RacpResponseCode::NoRecordsFound,
            0x07 => RacpResponseCode::AbortUnsuccessful,
            0x08 => RacpResponseCode::ProcedureNotCompleted,
            0x09 => RacpResponseCode::OperandNotSupported,
            other => RacpResponseCode::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            RacpResponseCode::Success => 0x01,
            RacpResponseCode::OpCodeNotSupported => 0x02,
            RacpResponseCode::InvalidOperator => 0x03,
            RacpResponseCode::OperatorNotSupported => 0x04,
            RacpResponseCode::InvalidOperand => 0x05,
            RacpResponseCode::NoRecordsFound => 0x06,
            RacpResponseCode::AbortUnsuccessful => 0x07,
            RacpResponseCode::ProcedureNotCompleted => 0x08,
            RacpResponseCode::OperandNotSupported => 0x09,
            RacpResponseCode::Unknown(value) => value,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == RacpResponseCode::Success
    }
}

impl fmt::Display for RacpResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RacpResponseCode::Unknown(value) => write!(f, "unknown response code {:#04x}", value),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A parsed indication received on the Record Access Control Point.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RacpResponse {
    /// Number of Stored Records Response (`0x05`).
    NumberOfRecords { count: u16 },
    /// Combined Report Response (`0x08`): records the server sent.
    CombinedReport { count: u16 },
    /// Response Code (`0x06`) answering the request with op code `request_op_code`.
    ResponseCode { request_op_code: u8, code: RacpResponseCode },
}

impl RacpResponse {
    /// The request op code this response answers, when it names one.
    pub fn request_op_code(&self) -> Option<RacpOpCode> {
        match self {
            RacpResponse::NumberOfRecords { .. } => Some(RacpOpCode::ReportNumberOfStoredRecords),
            RacpResponse::CombinedReport { .. } => Some(RacpOpCode::CombinedReport),
            RacpResponse::ResponseCode { request_op_code, .. } => RacpOpCode::from_u8(*request_op_code),
        }
    }
}
