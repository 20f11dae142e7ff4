// src/common/response/parse.rs

use super::error::RacpParseError;
use super::{RacpResponse, RacpResponseCode};

use crate::common::command::RacpOpCode;

/// Every response is `op code, operator, two bytes of operand`.
const RESPONSE_LEN: usize = 4;

// --- Internal Helpers ---
#[inline]
fn count_at_offset_two(buffer: &[u8]) -> u16 {
    u16::from_le_bytes([buffer[2], buffer[3]])
}

// --- Public Parsing Functions ---

/// Parses one RACP indication.
///
/// Dispatch is on the first byte: `0x05` number of records, `0x08` combined
/// report, `0x06` response code. Trailing bytes (an E2E-CRC for instance) are
/// ignored.
pub fn parse_racp_response(buffer: &[u8]) -> Result<RacpResponse, RacpParseError> {
    let op_code = *buffer.first().ok_or(RacpParseError::EmptyInput)?;

    let op_code = match RacpOpCode::from_u8(op_code) {
        Some(
            op @ (RacpOpCode::NumberOfStoredRecordsResponse
            | RacpOpCode::CombinedReportResponse
            | RacpOpCode::ResponseCode),
        ) => op,
        _ => return Err(RacpParseError::UnexpectedOpCode(op_code)),
    };

    if buffer.len() < RESPONSE_LEN {
        return Err(RacpParseError::TooShort { needed: RESPONSE_LEN, got: buffer.len() });
    }

    let response = match op_code {
        RacpOpCode::NumberOfStoredRecordsResponse => {
            RacpResponse::NumberOfRecords { count: count_at_offset_two(buffer) }
        }
        RacpOpCode::CombinedReportResponse => {
            RacpResponse::CombinedReport { count: count_at_offset_two(buffer) }
        }
        _ => RacpResponse::ResponseCode {
            request_op_code: buffer[2],
            code: RacpResponseCode::from_u8(buffer[3]),
        },
    };

    Ok(response)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_of_records_response() {
        assert_eq!(
            parse_racp_response(&[0x05, 0x00, 0x2A, 0x01]),
            Ok(RacpResponse::NumberOfRecords { count: 0x012A })
        );
    }

    #[test]
    fn test_combined_report_response_parsed_identically() {
        assert_eq!(
            parse_racp_response(&[0x08, 0x00, 0x2A, 0x01]),
            Ok(RacpResponse::CombinedReport { count: 0x012A })
        );
        assert_eq!(
            parse_racp_response(&[0x08, 0x00, 0x00, 0x00, 0xAB, 0xCD]),
            Ok(RacpResponse::CombinedReport { count: 0 })
        );
    }

    #[test]
    fn test_response_code() {
        assert_eq!(
            parse_racp_response(&[0x06, 0x00, 0x03, 0x01]),
            Ok(RacpResponse::ResponseCode { request_op_code: 0x03, code: RacpResponseCode::Success })
        );
        assert_eq!(
            parse_racp_response(&[0x06, 0x00, 0x07, 0x06]),
            Ok(RacpResponse::ResponseCode {
                request_op_code: 0x07,
                code: RacpResponseCode::NoRecordsFound
            })
        );
        assert_eq!(
            parse_racp_response(&[0x06, 0x00, 0x03, 0x42]),
            Ok(RacpResponse::ResponseCode {
                request_op_code: 0x03,
                code: RacpResponseCode::Unknown(0x42)
            })
        );
    }

    #[test]
    fn test_malformed_responses() {
        assert_eq!(parse_racp_response(&[]), Err(RacpParseError::EmptyInput));
        assert_eq!(
            parse_racp_response(&[0x05, 0x00, 0x01]),
            Err(RacpParseError::TooShort { needed: 4, got: 3 })
        );
        assert_eq!(parse_racp_response(&[0x04, 0x01]), Err(RacpParseError::UnexpectedOpCode(0x04)));
        assert_eq!(parse_racp_response(&[0x99]), Err(RacpParseError::UnexpectedOpCode(0x99)));
    }

    #[test]
    fn test_named_response_codes() {
        for raw in 0x01..=0x09u8 {
            assert_eq!(RacpResponseCode::from_u8(raw).as_u8(), raw);
        }
        assert!(RacpResponseCode::Success.is_success());
        assert!(!RacpResponseCode::AbortUnsuccessful.is_success());
    }
}
