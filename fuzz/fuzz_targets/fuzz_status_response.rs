#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use server_list_ping::protocol::response::verify_json;
use server_list_ping::protocol::status::StatusResponse;
use server_list_ping::{Packet, ServerStatus};

fuzz_target!(|data: &[u8]| {
    // Fuzz status payload decoding and the JSON layers behind it
    let packet = Packet {
        payload: Bytes::copy_from_slice(data),
    };
    if let Ok(response) = StatusResponse::decode(&packet) {
        if verify_json(&response.json).is_ok() {
            if let Ok(status) = ServerStatus::parse(&response.json) {
                let _ = status.description_text();
            }
        }
    }
});
