//! # Error Types
//!
//! Error handling for the Server List Ping client and its wire codec.
//!
//! Every failure a query can surface is a variant of [`ProtocolError`]. The
//! variants fall into a few families:
//!
//! ## Error Categories
//! - **Connection**: transport failures, passed through as [`ProtocolError::Io`]
//! - **Encoding**: a VarInt ran past its maximum group count
//! - **Truncation**: a field or frame ended after some of its bytes were read
//! - **Protocol violations**: wrong packet id, malformed text, non-JSON status
//! - **Cancellation**: the caller cancelled, or the deadline elapsed
//!
//! ## Example Usage
//! ```rust
//! use server_list_ping::error::{ProtocolError, Result};
//! use tracing::{error, info};
//!
//! fn classify(result: Result<String>) {
//!     match result {
//!         Ok(json) => info!(len = json.len(), "Got status"),
//!         Err(ProtocolError::Timeout) => error!("Server did not answer in time"),
//!         Err(e) if e.is_protocol_violation() => error!(error = %e, "Bad reply"),
//!         Err(e) => error!(error = %e, "Query failed"),
//!     }
//! }
//! # classify(Ok(String::new()));
//! ```

use std::io;
use thiserror::Error;

use crate::utils::cancel::CancelReason;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Status phase errors
    pub const ERR_NO_RESPONSE: &str = "Connection closed before a status response arrived";
    pub const ERR_MISSING_STATUS_TEXT: &str = "Status response carried no JSON text";
    pub const ERR_INVALID_UTF8: &str = "Text field is not valid UTF-8";

    /// Cancellation errors
    pub const ERR_CANCELLED: &str = "Operation was cancelled";
    pub const ERR_CONNECTION_ABORTED: &str = "Connection aborted";

    /// Configuration errors
    pub const ERR_TOO_LONG_HOSTNAME: &str = "Hostname does not fit in a handshake packet";
}

// ProtocolError is the primary error type for all query operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    VarIntTooLong { max_bytes: usize },

    #[error("Unexpected end of stream")]
    UnexpectedEof,

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Expected packet id {expected:#04x}, received {actual:#04x}")]
    UnexpectedPacket { expected: u32, actual: u32 },

    #[error("Invalid text field: {0}")]
    InvalidText(String),

    #[error("Invalid status response: {0}")]
    InvalidStatus(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether the peer sent something the status exchange does not allow.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnexpectedPacket { .. }
                | ProtocolError::InvalidText(_)
                | ProtocolError::InvalidStatus(_)
        )
    }

    /// Whether the query was stopped by the caller or by its deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProtocolError::Cancelled(_) | ProtocolError::Timeout)
    }
}

impl From<CancelReason> for ProtocolError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled(message) => ProtocolError::Cancelled(message),
            CancelReason::TimedOut => ProtocolError::Timeout,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
