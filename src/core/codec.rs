//! # Packet Framing
//!
//! [`PacketCodec`] plugs VarUint32 length-prefix framing into
//! `tokio_util::codec::Framed`, so the same framing runs over a TCP stream,
//! an in-memory duplex pipe, or anything else that is `AsyncRead + AsyncWrite`.
//!
//! End of stream at a frame boundary ends the `Framed` stream cleanly
//! (`None`); end of stream inside a frame is [`ProtocolError::UnexpectedEof`].

use bytes::{Buf, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::config::MAX_PACKET_SIZE;
use crate::core::packet::Packet;
use crate::core::varint::{read_var_u32, var_u32_len, write_var_u32};
use crate::error::{ProtocolError, Result};

/// Length-prefixed packet codec
#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_packet_size: usize,
}

impl PacketCodec {
    /// Create a codec that refuses frames larger than `max_packet_size` bytes.
    pub fn new(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(MAX_PACKET_SIZE)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        let mut header = &src[..];
        let len = match read_var_u32(&mut header) {
            Ok(Some(len)) => len as usize,
            // Prefix not complete yet
            Ok(None) | Err(ProtocolError::UnexpectedEof) => return Ok(None),
            Err(e) => return Err(e),
        };
        let prefix = src.len() - header.len();

        if len > self.max_packet_size {
            return Err(ProtocolError::OversizedPacket(len));
        }

        let frame_len = prefix + len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(prefix);
        let payload = src.split_to(len).freeze();
        Ok(Some(Packet { payload }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::UnexpectedEof),
        }
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<()> {
        let len = packet.payload.len();
        if len > self.max_packet_size {
            return Err(ProtocolError::OversizedPacket(len));
        }
        let prefix = u32::try_from(len).map_err(|_| ProtocolError::OversizedPacket(len))?;

        dst.reserve(var_u32_len(prefix) + len);
        write_var_u32(dst, prefix);
        dst.extend_from_slice(&packet.payload);
        Ok(())
    }
}

/// Framed packet stream over any byte stream
pub type PacketStream<S> = Framed<S, PacketCodec>;

/// Wrap `stream` in packet framing.
pub fn framed<S>(stream: S, max_packet_size: usize) -> PacketStream<S>
where
    S: AsyncRead + AsyncWrite,
{
    Framed::new(stream, PacketCodec::new(max_packet_size))
}

/// Build a packet with `body` and queue it on `stream`.
///
/// The frame is buffered, not flushed; call [`flush_packets`] before waiting
/// on a reply.
pub async fn write_packet<S, F>(stream: &mut PacketStream<S>, body: F) -> Result<()>
where
    S: AsyncWrite + Unpin,
    F: FnOnce(&mut BytesMut) -> Result<()>,
{
    let packet = Packet::build(body)?;
    stream.feed(packet).await
}

/// Push every queued frame to the transport.
pub async fn flush_packets<S>(stream: &mut PacketStream<S>) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    SinkExt::<Packet>::flush(stream).await
}

/// Read the next frame. `Ok(None)` means the peer closed at a frame boundary.
pub async fn read_packet<S>(stream: &mut PacketStream<S>) -> Result<Option<Packet>>
where
    S: AsyncRead + Unpin,
{
    stream.next().await.transpose()
}
