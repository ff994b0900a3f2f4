//! Status-phase packets of the Server List Ping exchange.
//!
//! ```text
//! C -> S  Handshake       id 0: VarInt protocol, String host, u16 BE port, VarInt next_state = 1
//! C -> S  StatusRequest   id 0: (empty)
//! C -> S  Ping            id 1: i64 BE payload
//! S -> C  StatusResponse  id 0: String json
//! ```
//!
//! Strings are VarUint32-length-prefixed UTF-8.

use bytes::BytesMut;

use crate::core::packet::Packet;
use crate::core::varint::{read_var_u32, write_var_i32, write_var_u32};
use crate::core::wire::{read_string, write_i64_be, write_string, write_u16_be};
use crate::error::{constants, ProtocolError, Result};

pub const HANDSHAKE_ID: u32 = 0x00;
pub const STATUS_REQUEST_ID: u32 = 0x00;
pub const PING_ID: u32 = 0x01;
pub const STATUS_RESPONSE_ID: u32 = 0x00;

/// State the handshake asks the server to switch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NextState {
    Status = 1,
}

/// A packet the client sends.
pub trait Serverbound {
    const ID: u32;

    /// Write the fields that follow the packet id.
    fn encode_body(&self, buf: &mut BytesMut) -> Result<()>;

    /// Write packet id and fields: the body builder handed to the framing.
    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        write_var_u32(buf, Self::ID);
        self.encode_body(buf)
    }

    fn to_packet(&self) -> Result<Packet> {
        Packet::build(|buf| self.encode(buf))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake<'a> {
    pub protocol_version: i32,
    pub hostname: &'a str,
    pub port: u16,
    pub next_state: NextState,
}

impl<'a> Handshake<'a> {
    pub fn status(protocol_version: i32, hostname: &'a str, port: u16) -> Self {
        Self {
            protocol_version,
            hostname,
            port,
            next_state: NextState::Status,
        }
    }
}

impl Serverbound for Handshake<'_> {
    const ID: u32 = HANDSHAKE_ID;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<()> {
        write_var_i32(buf, self.protocol_version);
        write_string(buf, self.hostname)?;
        write_u16_be(buf, self.port);
        write_var_i32(buf, self.next_state as i32);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRequest;

impl Serverbound for StatusRequest {
    const ID: u32 = STATUS_REQUEST_ID;

    fn encode_body(&self, _buf: &mut BytesMut) -> Result<()> {
        Ok(())
    }
}

/// Ping sent during the status phase.
///
/// The payload is always zero and the server's echo is never read back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ping {
    pub payload: i64,
}

impl Serverbound for Ping {
    const ID: u32 = PING_ID;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<()> {
        write_i64_be(buf, self.payload);
        Ok(())
    }
}

/// The server's status reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

impl StatusResponse {
    /// Decode from a received frame.
    ///
    /// The payload is read in isolation. Anything after the JSON text is
    /// ignored.
    pub fn decode(packet: &Packet) -> Result<Self> {
        let mut reader = packet.reader();
        let id = read_var_u32(&mut reader)?.ok_or(ProtocolError::UnexpectedEof)?;
        if id != STATUS_RESPONSE_ID {
            return Err(ProtocolError::UnexpectedPacket {
                expected: STATUS_RESPONSE_ID,
                actual: id,
            });
        }

        match read_string(&mut reader) {
            Ok(Some(json)) => Ok(Self { json }),
            Ok(None) => Err(ProtocolError::InvalidStatus(
                constants::ERR_MISSING_STATUS_TEXT.to_string(),
            )),
            // The frame arrived whole, so a short string is the peer's mistake.
            Err(ProtocolError::UnexpectedEof) => Err(ProtocolError::InvalidText(
                "declared length exceeds packet payload".to_string(),
            )),
            Err(e) => Err(e),
        }
    }
}
