//! # Transport
//!
//! Connection ownership and target discovery.
//!
//! - [`connection`]: exclusively-owned stream with abort and single release
//! - [`srv`]: best-effort SRV record lookup

pub mod connection;
pub mod srv;

pub use connection::{AbortHandle, Connection};
