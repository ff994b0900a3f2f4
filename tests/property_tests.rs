//! Property-based tests using proptest
//!
//! These tests validate codec invariants across a wide range of randomly
//! generated inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use server_list_ping::config::MAX_PACKET_SIZE;
use server_list_ping::core::codec::PacketCodec;
use server_list_ping::core::varint::{
    read_var_i32, read_var_u32, read_var_u64, var_u32_len, var_u64_len, write_var_i32,
    write_var_u32, write_var_u64,
};
use server_list_ping::core::wire::{read_string, write_string};
use server_list_ping::Packet;
use tokio_util::codec::{Decoder, Encoder};

// Property: VarUint32 decodes to what was encoded and consumes exactly its length
proptest! {
    #[test]
    fn prop_var_u32_roundtrip(value in any::<u32>()) {
        let mut buf = Vec::new();
        write_var_u32(&mut buf, value);
        prop_assert_eq!(buf.len(), var_u32_len(value));

        let mut cursor = &buf[..];
        prop_assert_eq!(read_var_u32(&mut cursor).unwrap(), Some(value));
        prop_assert!(cursor.is_empty());
    }
}

// Property: VarUint64 decodes to what was encoded
proptest! {
    #[test]
    fn prop_var_u64_roundtrip(value in any::<u64>()) {
        let mut buf = Vec::new();
        write_var_u64(&mut buf, value);
        prop_assert_eq!(buf.len(), var_u64_len(value));
        prop_assert!(buf.len() <= 10);

        let mut cursor = &buf[..];
        prop_assert_eq!(read_var_u64(&mut cursor).unwrap(), Some(value));
    }
}

// Property: signed values survive the two's-complement reinterpretation
proptest! {
    #[test]
    fn prop_var_i32_roundtrip(value in any::<i32>()) {
        let mut buf = Vec::new();
        write_var_i32(&mut buf, value);
        if value < 0 {
            prop_assert_eq!(buf.len(), 5);
        }

        let mut cursor = &buf[..];
        prop_assert_eq!(read_var_i32(&mut cursor).unwrap(), Some(value));
    }
}

// Property: every group but the last has its continuation bit set
proptest! {
    #[test]
    fn prop_var_u64_is_canonical(value in any::<u64>()) {
        let mut buf = Vec::new();
        write_var_u64(&mut buf, value);

        let (last, init) = buf.split_last().unwrap();
        prop_assert!(init.iter().all(|b| b & 0x80 != 0));
        prop_assert_eq!(last & 0x80, 0);
    }
}

// Property: any strict prefix of an encoding is a truncation, never a value
proptest! {
    #[test]
    fn prop_var_u32_prefix_is_eof(value in 128u32.., cut in 1usize..5) {
        let mut buf = Vec::new();
        write_var_u32(&mut buf, value);
        let cut = cut.min(buf.len() - 1);

        let mut cursor = &buf[..cut];
        prop_assert!(read_var_u32(&mut cursor).is_err());
    }
}

// Property: strings keep their contents through a length prefix
proptest! {
    #[test]
    fn prop_string_roundtrip(text in ".{0,512}") {
        let mut buf = BytesMut::new();
        write_string(&mut buf, &text).unwrap();

        let mut cursor = buf.freeze();
        prop_assert_eq!(read_string(&mut cursor).unwrap(), Some(text));
        prop_assert!(cursor.is_empty());
    }
}

// Property: back-to-back frames decode in order with the same payloads
proptest! {
    #[test]
    fn prop_frames_roundtrip(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..2000), 1..8)
    ) {
        let mut codec = PacketCodec::default();
        let mut wire = BytesMut::new();
        for payload in &payloads {
            codec
                .encode(Packet { payload: Bytes::from(payload.clone()) }, &mut wire)
                .unwrap();
        }

        for payload in &payloads {
            let packet = codec.decode(&mut wire).unwrap().expect("complete frame");
            prop_assert_eq!(&packet.payload[..], &payload[..]);
        }
        prop_assert!(wire.is_empty());
        prop_assert!(codec.decode_eof(&mut wire).unwrap().is_none());
    }
}

// Property: feeding a frame one byte at a time yields it exactly once, at the end
proptest! {
    #[test]
    fn prop_frame_split_anywhere(payload in prop::collection::vec(any::<u8>(), 0..600)) {
        let frame = Packet { payload: Bytes::from(payload.clone()) }.to_bytes().unwrap();
        let mut codec = PacketCodec::new(MAX_PACKET_SIZE);
        let mut buf = BytesMut::new();

        let (last, init) = frame.split_last().unwrap();
        for byte in init {
            buf.extend_from_slice(&[*byte]);
            prop_assert!(codec.decode(&mut buf).unwrap().is_none());
        }
        buf.extend_from_slice(&[*last]);
        let packet = codec.decode(&mut buf).unwrap().expect("complete frame");
        prop_assert_eq!(&packet.payload[..], &payload[..]);
    }
}

// Property: arbitrary bytes never panic the frame parser
proptest! {
    #[test]
    fn prop_from_bytes_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = Packet::from_bytes(&data);
        let mut codec = PacketCodec::default();
        let _ = codec.decode_eof(&mut BytesMut::from(&data[..]));
    }
}
