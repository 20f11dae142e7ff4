//! RACP command definitions.
//!
//! Commands are `opcode, operator [, operand]`; operands are little-endian.

use core::fmt;

use arrayvec::ArrayVec;

use super::{crc, GhsError};

/// RACP op codes, both requests and responses.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum RacpOpCode {
    ReportStoredRecords = 0x01,
    DeleteStoredRecords = 0x02,
    Abort = 0x03,
    ReportNumberOfStoredRecords = 0x04,
    NumberOfStoredRecordsResponse = 0x05,
    ResponseCode = 0x06,
    CombinedReport = 0x07,
    CombinedReportResponse = 0x08,
}

impl RacpOpCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(RacpOpCode::ReportStoredRecords),
            0x02 => Some(RacpOpCode::DeleteStoredRecords),
            0x03 => Some(RacpOpCode::Abort),
            0x04 => Some(RacpOpCode::ReportNumberOfStoredRecords),
            0x05 => Some(RacpOpCode::NumberOfStoredRecordsResponse),
            0x06 => Some(RacpOpCode::ResponseCode),
            0x07 => Some(RacpOpCode::CombinedReport),
            0x08 => Some(RacpOpCode::CombinedReportResponse),
            _ => None,
        }
    }
}

/// RACP operators.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum RacpOperator {
    Null = 0x00,
    AllRecords = 0x01,
    LessThanOrEqual = 0x02,
    GreaterThanOrEqual = 0x03,
}

/// Filter type octet preceding a record number operand.
pub const FILTER_TYPE_RECORD_NUMBER: u8 = 0x01;

/// Which stored records a procedure applies to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum RecordFilter {
    /// Every stored record (`operator 0x01`, no operand).
    #[default]
    All,
    /// Records whose record number is `>= N` (`operator 0x03`).
    FromRecordNumber(u32),
}

/// Longest encoded command: opcode, operator, filter type, 4-byte operand, 2-byte CRC.
pub const MAX_COMMAND_LEN: usize = 9;

/// Fixed-capacity buffer holding one encoded command.
pub type CommandBuffer = ArrayVec<u8, MAX_COMMAND_LEN>;

/// A RACP request written by the collector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RacpCommand {
    /// Report Number of Stored Records (`0x04`).
    NumberOfStoredRecords { filter: RecordFilter },
    /// Combined Report (`0x07`): stream the records and report how many were sent.
    CombinedReport { filter: RecordFilter },
    /// Delete Stored Records (`0x02`).
    DeleteStoredRecords { filter: RecordFilter },
    /// Abort Operation (`0x03`, null operator).
    Abort,
}

impl RacpCommand {
    pub fn op_code(&self) -> RacpOpCode {
        match self {
            RacpCommand::NumberOfStoredRecords { .. } => RacpOpCode::ReportNumberOfStoredRecords,
            RacpCommand::CombinedReport { .. } => RacpOpCode::CombinedReport,
            RacpCommand::DeleteStoredRecords { .. } => RacpOpCode::DeleteStoredRecords,
            RacpCommand::Abort => RacpOpCode::Abort,
        }
    }

    fn filter(&self) -> Option<RecordFilter> {
        match self {
            RacpCommand::NumberOfStoredRecords { filter }
            | RacpCommand::CombinedReport { filter }
            | RacpCommand::DeleteStoredRecords { filter } => Some(*filter),
            RacpCommand::Abort => None,
        }
    }

    /// Encodes the command into its wire bytes.
    pub fn format_into<E: fmt::Debug>(&self) -> Result<CommandBuffer, GhsError<E>> {
        let mut buffer = CommandBuffer::new();
        push_all::<E>(&mut buffer, &[self.op_code() as u8])?;

        match self.filter() {
            None => push_all::<E>(&mut buffer, &[RacpOperator::Null as u8])?,
            Some(RecordFilter::All) => push_all::<E>(&mut buffer, &[RacpOperator::AllRecords as u8])?,
            Some(RecordFilter::FromRecordNumber(record_number)) => {
                push_all::<E>(
                    &mut buffer,
                    &[RacpOperator::GreaterThanOrEqual as u8, FILTER_TYPE_RECORD_NUMBER],
                )?;
                push_all::<E>(&mut buffer, &record_number.to_le_bytes())?;
            }
        }

        Ok(buffer)
    }

    /// Encodes the command followed by its E2E-CRC.
    pub fn format_with_e2e_crc<E: fmt::Debug>(&self) -> Result<CommandBuffer, GhsError<E>> {
        let mut buffer = self.format_into::<E>()?;
        let crc_bytes = crc::encode_e2e_crc(crc::calculate_e2e_crc(&buffer));
        push_all::<E>(&mut buffer, &crc_bytes)?;
        Ok(buffer)
    }
}

fn push_all<E: fmt::Debug>(buffer: &mut CommandBuffer, bytes: &[u8]) -> Result<(), GhsError<E>> {
    buffer
        .try_extend_from_slice(bytes)
        .map_err(|_| GhsError::CommandBufferOverflow {
            needed: buffer.len() + bytes.len(),
            capacity: buffer.capacity(),
        })
}

impl fmt::Display for RacpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RacpCommand::NumberOfStoredRecords { .. } => "number of stored records",
            RacpCommand::CombinedReport { .. } => "combined report",
            RacpCommand::DeleteStoredRecords { .. } => "delete stored records",
            RacpCommand::Abort => return f.write_str("abort"),
        };
        match self.filter() {
            Some(RecordFilter::FromRecordNumber(n)) => write!(f, "{} (records >= {})", name, n),
            _ => write!(f, "{} (all records)", name),
        }
    }
}
