//! # Status Protocol
//!
//! Packet layouts for the handshake/status/ping exchange and a typed view of
//! the status JSON. Only the status phase is modelled; login and play state
//! packets are not.

pub mod response;
pub mod status;

pub use response::{verify_json, ServerStatus};
pub use status::{Handshake, NextState, Ping, Serverbound, StatusRequest, StatusResponse};
