// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod command;
pub mod crc;
pub mod error;
pub mod flags;
pub mod frame;
pub mod hal_traits;
pub mod response;
pub mod timing;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

// From address.rs
pub use address::DeviceAddress;

// From command.rs
pub use command::{CommandBuffer, RacpCommand, RacpOpCode, RacpOperator, RecordFilter};

// From crc.rs
pub use crc::{calculate_e2e_crc, encode_e2e_crc, strip_e2e_crc};

// From error.rs
pub use error::GhsError;

// From flags.rs
pub use flags::{FlagBit, FlagSet};

// From frame.rs
pub use frame::{FrameMarker, SegmentHeader, SegmentRole};

// From hal_traits.rs
pub use hal_traits::{Characteristic, GhsTransport};

// From response/mod.rs
pub use response::{parse_racp_response, RacpParseError, RacpResponse, RacpResponseCode};

// From types.rs
pub use types::{MderFloat, ObservationClass, ObservationType, UnitCode};
