// src/lib.rs

#![no_std] // Specify no_std at the crate root

// Reassembly buffers, observation lists and session maps are heap-backed.
extern crate alloc;

pub mod collector;
pub mod common;
pub mod observation;
pub mod racp;
pub mod reassembly;

// Re-export key types for convenience
pub use collector::{Channel, CollectorConfig, GhsCollector, GhsEvent};
pub use common::{DeviceAddress, GhsError, GhsTransport, RecordFilter};
pub use observation::{CodecConfig, Observation, ObservationCodec, ObservationFormat, ObservationValue};
