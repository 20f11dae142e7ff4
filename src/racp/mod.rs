// src/racp/mod.rs

//! Record Access Control Point client.
//!
//! [`RacpSession`] holds the per-device procedure state: it hands out the
//! command to write when a procedure starts and turns each parsed response
//! into a [`RacpTransition`]. Writing the commands is left to the caller.

pub mod session;

pub use session::{RacpEvent, RacpSession, RacpState, RacpTransition};
