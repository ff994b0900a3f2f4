//! End-to-end status queries against mock servers on loopback.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use server_list_ping::config::{PingConfig, MAX_PACKET_SIZE};
use server_list_ping::core::codec::{flush_packets, framed, read_packet, write_packet};
use server_list_ping::core::varint::write_var_u32;
use server_list_ping::core::wire::write_string;
use server_list_ping::utils::metrics::Metrics;
use server_list_ping::{
    server_list_ping, CancelHandle, Packet, ProtocolError, QueryOptions, QueryTarget, StatusClient,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const STATUS_JSON: &str = r#"{"version":{"protocol":47}}"#;

/// Accept one connection and hand it to `handler`.
async fn spawn_peer<F, Fut>(handler: F) -> (SocketAddr, JoinHandle<Fut::Output>)
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        handler(stream).await
    });
    (addr, handle)
}

/// Listener that records how many bytes a client sent, or 0 if nobody connected.
async fn spawn_byte_counter() -> (SocketAddr, JoinHandle<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        match timeout(Duration::from_millis(300), listener.accept()).await {
            Ok(Ok((mut stream, _))) => {
                let mut received = Vec::new();
                stream.read_to_end(&mut received).await.unwrap_or(0);
                received.len()
            }
            _ => 0,
        }
    });
    (addr, handle)
}

/// Silent peer: reads until the client goes away and reports what it got.
async fn spawn_silent_peer() -> (SocketAddr, JoinHandle<std::io::Result<usize>>) {
    spawn_peer(|mut stream| async move {
        let mut received = Vec::new();
        timeout(Duration::from_secs(5), stream.read_to_end(&mut received))
            .await
            .expect("client never closed the connection")
    })
    .await
}

fn target(addr: SocketAddr) -> QueryTarget {
    QueryTarget::new(addr.ip().to_string())
        .with_port(addr.port())
        .ignore_srv(true)
}

fn response(id: u32, text: &str) -> impl FnOnce(&mut bytes::BytesMut) -> server_list_ping::Result<()> + '_ {
    move |buf| {
        write_var_u32(buf, id);
        write_string(buf, text)
    }
}

/// Peer that checks the three request packets, replies with packet `id`
/// carrying `text`, then waits for the client to close.
async fn spawn_status_peer(id: u32, text: &'static str) -> (SocketAddr, JoinHandle<Vec<Packet>>) {
    spawn_peer(move |stream| async move {
        let mut packets = framed(stream, MAX_PACKET_SIZE);
        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(read_packet(&mut packets).await.unwrap().unwrap());
        }
        write_packet(&mut packets, response(id, text)).await.unwrap();
        flush_packets(&mut packets).await.unwrap();

        // The client must close once it has its answer.
        let after = timeout(Duration::from_secs(5), read_packet(&mut packets))
            .await
            .expect("client kept the connection open");
        assert!(after.unwrap().is_none());
        received
    })
    .await
}

#[tokio::test]
async fn test_returns_status_json_verbatim() {
    let (addr, peer) = spawn_status_peer(0, STATUS_JSON).await;

    let json = server_list_ping(QueryOptions::new(target(addr))).await.unwrap();
    assert_eq!(json, STATUS_JSON);

    let received = peer.await.unwrap();
    let handshake = &received[0].payload;
    assert_eq!(handshake[0], 0x00, "handshake id");
    assert_eq!(&handshake[1..6], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], "protocol -1");
    assert_eq!(handshake[6] as usize, "127.0.0.1".len());
    assert_eq!(&handshake[7..16], b"127.0.0.1");
    assert_eq!(&handshake[16..18], &addr.port().to_be_bytes());
    assert_eq!(handshake[18], 0x01, "next state = status");
    assert_eq!(&received[1].payload[..], &[0x00]);
    assert_eq!(&received[2].payload[..], &[0x01, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[tokio::test]
async fn test_custom_protocol_version_is_sent() {
    let (addr, peer) = spawn_status_peer(0, "{}").await;

    let target = target(addr).with_protocol_version(765);
    server_list_ping(QueryOptions::new(target)).await.unwrap();

    let received = peer.await.unwrap();
    assert_eq!(&received[0].payload[1..3], &[0xFD, 0x05]);
}

#[tokio::test]
async fn test_wrong_packet_id_is_protocol_violation() {
    let (addr, peer) = spawn_status_peer(1, STATUS_JSON).await;

    let err = server_list_ping(QueryOptions::new(target(addr))).await.unwrap_err();
    assert!(
        matches!(err, ProtocolError::UnexpectedPacket { expected: 0, actual: 1 }),
        "unexpected error: {err:?}"
    );
    assert!(err.is_protocol_violation());
    peer.await.unwrap();
}

#[tokio::test]
async fn test_non_json_status_is_rejected() {
    let (addr, peer) = spawn_status_peer(0, "definitely not json").await;

    let err = server_list_ping(QueryOptions::new(target(addr))).await.unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidStatus(_)), "unexpected error: {err:?}");
    peer.await.unwrap();
}

#[tokio::test]
async fn test_json_check_can_be_disabled() {
    let (addr, peer) = spawn_status_peer(0, "raw text").await;

    let config = PingConfig::default_with_overrides(|c| c.client.verify_json = false);
    let client = StatusClient::new(&config);
    assert_eq!(client.query(&target(addr), None).await.unwrap(), "raw text");
    peer.await.unwrap();
}

#[tokio::test]
async fn test_peer_closing_without_reply_is_unexpected_eof() {
    let (addr, peer) = spawn_peer(|stream| async move {
        let mut packets = framed(stream, MAX_PACKET_SIZE);
        for _ in 0..3 {
            read_packet(&mut packets).await.unwrap().unwrap();
        }
    })
    .await;

    let err = server_list_ping(QueryOptions::new(target(addr))).await.unwrap_err();
    assert!(matches!(err, ProtocolError::UnexpectedEof), "unexpected error: {err:?}");
    peer.await.unwrap();
}

#[tokio::test]
async fn test_truncated_response_frame_is_unexpected_eof() {
    use tokio::io::AsyncWriteExt;

    let (addr, peer) = spawn_peer(|stream| async move {
        let mut packets = framed(stream, MAX_PACKET_SIZE);
        for _ in 0..3 {
            read_packet(&mut packets).await.unwrap().unwrap();
        }
        let mut stream = packets.into_inner();
        // Declares 32 bytes, sends 3
        stream.write_all(&[0x20, 0x00, 0x01, b'{']).await.unwrap();
    })
    .await;

    let err = server_list_ping(QueryOptions::new(target(addr))).await.unwrap_err();
    assert!(matches!(err, ProtocolError::UnexpectedEof), "unexpected error: {err:?}");
    peer.await.unwrap();
}

#[tokio::test]
async fn test_pre_cancelled_query_writes_nothing() {
    let (addr, peer) = spawn_byte_counter().await;
    let cancel = CancelHandle::new();
    cancel.cancel_with("caller gave up");

    let err = server_list_ping(QueryOptions::new(target(addr)).with_cancel(cancel))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ProtocolError::Cancelled(ref reason) if reason == "caller gave up"),
        "unexpected error: {err:?}"
    );
    assert_eq!(peer.await.unwrap(), 0);
}

#[tokio::test]
async fn test_unbounded_timeout_completes_query() {
    let (addr, peer) = spawn_status_peer(0, STATUS_JSON).await;

    let json = server_list_ping(QueryOptions::new(target(addr)).with_timeout(Duration::MAX))
        .await
        .unwrap();
    assert_eq!(json, STATUS_JSON);
    assert_eq!(peer.await.unwrap().len(), 3);
}

// A zero deadline is already expired: the query gives up before connecting.
#[tokio::test]
async fn test_zero_deadline_times_out() {
    let (addr, peer) = spawn_byte_counter().await;

    let started = Instant::now();
    let err = server_list_ping(QueryOptions::new(target(addr)).with_timeout(Duration::ZERO))
        .await
        .unwrap_err();

    assert!(matches!(err, ProtocolError::Timeout), "unexpected error: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(peer.await.unwrap(), 0);
}

#[tokio::test]
async fn test_deadline_aborts_silent_peer_and_closes_connection() {
    let (addr, peer) = spawn_silent_peer().await;

    let started = Instant::now();
    let err = server_list_ping(
        QueryOptions::new(target(addr)).with_timeout(Duration::from_millis(200)),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ProtocolError::Timeout), "unexpected error: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));

    // The peer saw the three requests, then end of stream.
    let received = peer.await.unwrap().unwrap();
    assert!(received > 0);
}

#[tokio::test]
async fn test_cancel_mid_query_aborts_and_closes_connection() {
    let (addr, peer) = spawn_silent_peer().await;
    let cancel = CancelHandle::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel_with("shutdown");
    });

    let err = server_list_ping(
        QueryOptions::new(target(addr))
            .with_cancel(cancel)
            .with_timeout(Duration::from_secs(10)),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, ProtocolError::Cancelled(ref reason) if reason == "shutdown"),
        "unexpected error: {err:?}"
    );
    assert!(peer.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_connection_refused_passes_through() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = server_list_ping(QueryOptions::new(target(addr))).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Io(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_every_connection_is_closed_once() {
    let metrics = Arc::new(Metrics::new());
    let client = StatusClient::default().with_metrics(metrics.clone());

    let (addr, peer) = spawn_status_peer(0, STATUS_JSON).await;
    client.query(&target(addr), None).await.unwrap();
    peer.await.unwrap();

    let (addr, peer) = spawn_status_peer(1, STATUS_JSON).await;
    client.query(&target(addr), None).await.unwrap_err();
    peer.await.unwrap();

    let (addr, peer) = spawn_silent_peer().await;
    let options = QueryOptions::new(target(addr)).with_timeout(Duration::from_millis(100));
    client.query_with(&options).await.unwrap_err();
    peer.await.unwrap().unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.queries_total, 3);
    assert_eq!(snapshot.queries_success, 1);
    assert_eq!(snapshot.protocol_errors, 1);
    assert_eq!(snapshot.timeouts, 1);
    assert_eq!(snapshot.connections_opened, 3);
    assert_eq!(snapshot.connections_closed, 3);
    assert_eq!(snapshot.packets_sent, 9);
}
