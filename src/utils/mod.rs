//! # Utility Modules
//!
//! Cancellation, deadlines, logging and metrics shared by the client.
//!
//! ## Components
//! - **Cancel**: caller handle + deadline composition and the abortable race
//! - **Timeout**: deadline-only race and default timeouts
//! - **Logging**: structured logging configuration
//! - **Metrics**: thread-safe query counters

pub mod cancel;
pub mod logging;
pub mod metrics;
pub mod timeout;

pub use cancel::{CancelContext, CancelHandle, CancelReason};
