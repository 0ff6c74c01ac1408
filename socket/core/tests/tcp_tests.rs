//! Plain TCP transport over loopback

use std::io::{self, Write};
use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use socket_core::transport::create_transport;
use socket_core::{
    AnyError, AnySocket, HandleConfig, ShutdownDirection, SocketHandle, SocketOption,
    SocketOptionValue, TcpConnection, TcpTransport, Timeout, TransportConfig,
};

/// Returns (client, server-side) streams of one loopback connection
async fn connected_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (client.unwrap(), accepted.unwrap().0)
}

async fn plain_handle(read_timeout: Timeout) -> (TcpStream, SocketHandle<TcpTransport>) {
    let (client, server) = connected_pair().await;
    let config = HandleConfig::new(TcpTransport::new(), read_timeout);
    let handle = SocketHandle::new(TcpConnection::new(server).unwrap(), &config);
    (client, handle)
}

#[tokio::test]
async fn test_recv_returns_next_delivery() {
    let (mut client, mut handle) = plain_handle(Timeout::from_millis(1000)).await;

    client.write_all(b"hello").await.unwrap();
    let data = handle.recv(0, None).await.unwrap();

    assert_eq!(&data[..], b"hello");
}

#[tokio::test]
async fn test_recv_length_waits_for_all_bytes() {
    let (mut client, mut handle) = plain_handle(Timeout::from_millis(1000)).await;

    let writer = tokio::spawn(async move {
        client.write_all(b"abc").await.unwrap();
        client.flush().await.unwrap();
        client.write_all(b"defg").await.unwrap();
        client
    });

    let data = handle.recv(6, None).await.unwrap();
    assert_eq!(&data[..], b"abcdef");

    let _client = writer.await.unwrap();
    let rest = handle.recv(0, None).await.unwrap();
    assert_eq!(&rest[..], b"g");
}

#[tokio::test]
async fn test_recv_times_out_with_read_timeout() {
    let (_client, mut handle) = plain_handle(Timeout::from_millis(50)).await;

    let err = handle.recv(0, None).await.unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
}

#[tokio::test]
async fn test_recv_explicit_timeout_beats_infinite_default() {
    let (_client, mut handle) = plain_handle(Timeout::Infinite).await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        handle.recv(0, Some(Timeout::from_millis(20))),
    )
    .await
    .expect("explicit timeout should fire before the guard");

    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
}

#[tokio::test]
async fn test_timed_out_recv_keeps_partial_bytes() {
    let (mut client, mut handle) = plain_handle(Timeout::Infinite).await;

    client.write_all(b"abc").await.unwrap();
    let err = handle
        .recv(6, Some(Timeout::from_millis(100)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    assert_eq!(handle.connection().buffered_len(), 3);

    let data = handle
        .recv(0, Some(Timeout::from_millis(300)))
        .await
        .unwrap();
    assert_eq!(&data[..], b"abc");
    assert_eq!(handle.connection().buffered_len(), 0);
}

#[tokio::test]
async fn test_length_prefixed_frame_survives_slow_sender() {
    let (mut client, mut handle) = plain_handle(Timeout::Infinite).await;

    client.write_all(&[0, 5, b'h', b'e']).await.unwrap();
    let header = handle.recv(2, Some(Timeout::from_millis(300))).await.unwrap();
    let body_len = usize::from(u16::from_be_bytes([header[0], header[1]]));

    assert!(handle
        .recv(body_len, Some(Timeout::from_millis(50)))
        .await
        .is_err());

    client.write_all(b"llo").await.unwrap();
    let body = handle
        .recv(body_len, Some(Timeout::from_millis(300)))
        .await
        .unwrap();
    assert_eq!(&body[..], b"hello");
}

#[tokio::test]
async fn test_recv_huge_length_is_not_a_panic() {
    let (mut client, mut handle) = plain_handle(Timeout::Infinite).await;

    client.write_all(b"abc").await.unwrap();
    let err = handle
        .recv(usize::MAX, Some(Timeout::from_millis(100)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);

    drop(client);
    let data = handle
        .recv(1 << 40, Some(Timeout::from_millis(300)))
        .await
        .unwrap();
    assert_eq!(&data[..], b"abc");
}

#[tokio::test]
async fn test_recv_after_peer_close_is_eof_error() {
    let (client, mut handle) = plain_handle(Timeout::from_millis(1000)).await;
    drop(client);

    let err = handle.recv(0, None).await.unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[tokio::test]
async fn test_send_single_and_chunks() {
    let (mut client, mut handle) = plain_handle(Timeout::Infinite).await;

    handle.send("one,").await.unwrap();
    handle
        .send(vec![Bytes::from_static(b"two,"), Bytes::from_static(b"three")])
        .await
        .unwrap();
    handle.close().await.unwrap();

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, b"one,two,three");

    let stats = handle.getstat();
    assert_eq!(stats.send_oct, 13);
    assert_eq!(stats.send_cnt, 2);
}

#[tokio::test]
async fn test_sendfile_region() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"0123456789abcdefghij").unwrap();

    let (mut client, mut handle) = plain_handle(Timeout::Infinite).await;

    let written = handle.sendfile(file.path(), 10, 5).await.unwrap();
    assert_eq!(written, 5);
    let written = handle.sendfile(file.path(), 15, 0).await.unwrap();
    assert_eq!(written, 5);
    handle.shutdown(ShutdownDirection::Write).await.unwrap();

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, b"abcdefghij");
}

#[tokio::test]
async fn test_sendfile_missing_file_is_error() {
    let (_client, mut handle) = plain_handle(Timeout::Infinite).await;

    let err = handle
        .sendfile("/nonexistent/file.bin", 0, 0)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_shutdown_write_gives_peer_eof_but_keeps_reading() {
    let (mut client, mut handle) = plain_handle(Timeout::from_millis(1000)).await;

    handle.shutdown(ShutdownDirection::Write).await.unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(client.read(&mut buf).await.unwrap(), 0);

    client.write_all(b"late").await.unwrap();
    let data = handle.recv(0, None).await.unwrap();
    assert_eq!(&data[..], b"late");
}

#[tokio::test]
async fn test_close_twice_is_an_error_not_a_panic() {
    let (_client, mut handle) = plain_handle(Timeout::Infinite).await;

    assert!(handle.close().await.is_ok());
    assert_eq!(handle.close().await.unwrap_err().kind(), io::ErrorKind::NotConnected);
    assert_eq!(
        handle.recv(0, None).await.unwrap_err().kind(),
        io::ErrorKind::NotConnected
    );
    assert_eq!(
        handle.getopts(&[SocketOption::NoDelay]).unwrap_err().kind(),
        io::ErrorKind::NotConnected
    );
    assert!(!handle.connection().is_open());
}

#[tokio::test]
async fn test_socket_options_round_trip() {
    let (_client, handle) = plain_handle(Timeout::Infinite).await;

    handle
        .setopts(&[
            SocketOptionValue::NoDelay(true),
            SocketOptionValue::KeepAlive(true),
        ])
        .unwrap();

    let values = handle
        .getopts(&[SocketOption::NoDelay, SocketOption::KeepAlive])
        .unwrap();
    assert_eq!(
        values,
        vec![
            SocketOptionValue::NoDelay(true),
            SocketOptionValue::KeepAlive(true),
        ]
    );
}

#[tokio::test]
async fn test_active_option_unsupported() {
    let (_client, handle) = plain_handle(Timeout::Infinite).await;

    let err = handle.getopts(&[SocketOption::Active]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);

    let err = handle.setopts(&[SocketOptionValue::Active(true)]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

#[tokio::test]
async fn test_address_info_and_flags() {
    let (client, mut handle) = plain_handle(Timeout::Infinite).await;

    assert_eq!(handle.local_info().address, client.peer_addr().unwrap());
    assert_eq!(handle.peer_info().address, client.local_addr().unwrap());
    assert_eq!(handle.peer_info().certificate, None);
    assert!(!handle.is_secure());
    assert_eq!(handle.negotiated_protocol(), None);

    // Metadata survives close
    handle.close().await.unwrap();
    assert_eq!(handle.peer_info().address, client.local_addr().unwrap());
    assert!(!handle.is_secure());
}

#[tokio::test]
async fn test_handshake_is_noop() {
    let (mut client, mut handle) = plain_handle(Timeout::from_millis(1000)).await;

    client.write_all(b"x").await.unwrap();
    let data = handle.handshake().await.unwrap().recv(0, None).await.unwrap();

    assert_eq!(&data[..], b"x");
}

#[tokio::test]
async fn test_any_transport_from_config() {
    let config = TransportConfig::plain().with_read_timeout_ms(5000);
    let handle_config = config.handle_config(create_transport(&config).unwrap());
    assert_eq!(handle_config.read_timeout, Timeout::from_millis(5000));

    let (mut client, server) = connected_pair().await;
    let connection = handle_config.transport.wrap(server).unwrap();
    let mut socket: AnySocket = SocketHandle::new(connection, &handle_config);

    socket.handshake().await.unwrap();
    client.write_all(b"ping").await.unwrap();
    let data = socket.recv(0, None).await.unwrap();
    socket.send(data).await.unwrap();

    let mut buf = [0u8; 4];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");
    assert!(!socket.is_secure());

    socket.close().await.unwrap();
    match socket.close().await {
        Err(AnyError::Plain(err)) => assert_eq!(err.kind(), io::ErrorKind::NotConnected),
        other => panic!("expected plain NotConnected error, got {other:?}"),
    }
}
