//! # Server List Ping
//!
//! Query a Minecraft server's status over the Server List Ping exchange,
//! with a byte-exact VarInt wire codec and cancellation that never leaves a
//! connection open or a task hanging.
//!
//! ## Flow
//! ```text
//! resolve (SRV, best effort) -> connect -> Handshake -> StatusRequest -> Ping
//!   -> flush -> read StatusResponse -> verify -> close
//! ```
//!
//! The whole exchange runs under a [`CancelContext`](utils::cancel::CancelContext)
//! combining the caller's [`CancelHandle`](utils::cancel::CancelHandle) with a
//! deadline. Whichever fires first aborts the connection and surfaces as
//! [`ProtocolError::Cancelled`] or [`ProtocolError::Timeout`].
//!
//! ## Example
//! ```rust,no_run
//! use server_list_ping::{server_list_ping, QueryOptions, QueryTarget};
//! use std::time::Duration;
//!
//! # async fn run() -> server_list_ping::Result<()> {
//! let target: QueryTarget = "mc.example.net".parse()?;
//! let json = server_list_ping(QueryOptions::new(target).with_timeout(Duration::from_secs(5))).await?;
//! println!("{json}");
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::core::packet::Packet;
pub use error::{ProtocolError, Result};
pub use protocol::ServerStatus;
pub use service::{server_list_ping, QueryOptions, QueryTarget, StatusClient};
pub use utils::cancel::{CancelContext, CancelHandle, CancelReason};
