//! # Core Wire Components
//!
//! Byte-level encoding and packet framing for the Server List Ping protocol.
//!
//! ## Components
//! - **VarInt**: 7-bit group variable-length integers (32 and 64 bit)
//! - **Wire**: fixed-width integers, length-prefixed buffers and UTF-8 text
//! - **Packet**: opaque payload built from a body closure
//! - **Codec**: Tokio codec for length-prefixed framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [Length: VarUint32] [Payload(Length)]
//! ```
//!
//! ## Safety
//! - Frames above the configured maximum are refused before buffering
//! - VarInts longer than their maximum group count are rejected
//! - Payload fields are decoded from an isolated buffer, never the live stream

pub mod codec;
pub mod packet;
pub mod varint;
pub mod wire;
