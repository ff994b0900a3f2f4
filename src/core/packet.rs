use bytes::{Buf, Bytes, BytesMut};

use crate::config::MAX_PACKET_SIZE;
use crate::core::varint::{read_var_u32, var_u32_len, write_var_u32};
use crate::error::{ProtocolError, Result};

/// One frame of the wire protocol: an opaque payload.
///
/// On the wire every packet is `VarUint32(payload length) ++ payload`. The
/// payload itself starts with the packet id, but that is a concern of the
/// status layer; framing never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub payload: Bytes,
}

impl Packet {
    /// Build a packet by running `body` against a fresh scratch buffer.
    pub fn build<F>(body: F) -> Result<Self>
    where
        F: FnOnce(&mut BytesMut) -> Result<()>,
    {
        let mut scratch = BytesMut::with_capacity(64);
        body(&mut scratch)?;
        Ok(Self {
            payload: scratch.freeze(),
        })
    }

    /// Build a packet whose payload begins with the VarUint32 `id`.
    pub fn with_id<F>(id: u32, body: F) -> Result<Self>
    where
        F: FnOnce(&mut BytesMut) -> Result<()>,
    {
        Self::build(|buf| {
            write_var_u32(buf, id);
            body(buf)
        })
    }

    /// An isolated cursor over the payload for field-level decoding.
    ///
    /// Reading from it never touches the connection, so a malformed field
    /// cannot desynchronise the framing.
    #[inline]
    pub fn reader(&self) -> Bytes {
        self.payload.clone()
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Size of this packet on the wire, length prefix included.
    pub fn wire_len(&self) -> usize {
        var_u32_len(self.payload.len() as u32) + self.payload.len()
    }

    /// Serialize as a complete frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let len = u32::try_from(self.payload.len())
            .map_err(|_| ProtocolError::OversizedPacket(self.payload.len()))?;
        let mut out = Vec::with_capacity(self.wire_len());
        write_var_u32(&mut out, len);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parse exactly one complete frame from the front of `data`.
    ///
    /// Trailing bytes after the frame are ignored. An empty or truncated
    /// input is [`ProtocolError::UnexpectedEof`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        let len = read_var_u32(&mut cursor)?.ok_or(ProtocolError::UnexpectedEof)? as usize;
        if len > MAX_PACKET_SIZE {
            return Err(ProtocolError::OversizedPacket(len));
        }
        if cursor.remaining() < len {
            return Err(ProtocolError::UnexpectedEof);
        }
        Ok(Self {
            payload: Bytes::copy_from_slice(&cursor[..len]),
        })
    }
}
