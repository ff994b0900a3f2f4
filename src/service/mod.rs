//! # Service
//!
//! The Server List Ping client: resolve, connect, exchange, close.

pub mod client;

pub use client::{server_list_ping, QueryOptions, QueryTarget, StatusClient};
