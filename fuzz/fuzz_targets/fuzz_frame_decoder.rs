#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use server_list_ping::core::codec::PacketCodec;
use server_list_ping::Packet;
use tokio_util::codec::{Decoder, Encoder};

fuzz_target!(|data: &[u8]| {
    // Split frames out of arbitrary bytes until the codec stalls or rejects them
    let mut codec = PacketCodec::new(64 * 1024);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(packet)) = codec.decode(&mut buf) {
        // Re-encoding a decoded frame must reproduce it
        let mut wire = BytesMut::new();
        if codec.encode(packet.clone(), &mut wire).is_ok() {
            let again = Packet::from_bytes(&wire).expect("re-encoded frame must parse");
            assert_eq!(again, packet);
        }
    }
    let _ = codec.decode_eof(&mut buf);
});
