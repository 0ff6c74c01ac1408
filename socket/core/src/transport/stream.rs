//! Stream Helpers
//!
//! Byte-stream plumbing shared by the TCP and TLS backends: bounded reads,
//! chunked writes, file-region copies and socket options on the underlying
//! TCP socket.

use std::io::{self, SeekFrom};
use std::path::Path;

use bytes::{Bytes, BytesMut};
use socket2::SockRef;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::types::{IoData, SocketOption, SocketOptionValue, StatsSnapshot};
use crate::timeout::{with_timeout, Timeout};

/// Largest single delivery returned by a `recv(0)`, and the most the read
/// buffer grows by per socket read
pub const MAX_DELIVERY: usize = 64 * 1024;

/// Read once (`length == 0`) or until `length` bytes / EOF
///
/// Bytes come off the socket into `buffered`, the connection's read buffer,
/// and are only taken out of it once the call succeeds. A timeout or I/O
/// error leaves whatever already arrived in `buffered` for the next call.
/// A `length == 0` call with data already buffered returns it without
/// touching the socket.
///
/// EOF with nothing buffered is reported as `UnexpectedEof`; EOF after a
/// partial read returns the partial data.
pub(crate) async fn read_bytes<R>(
    reader: &mut R,
    buffered: &mut BytesMut,
    length: usize,
    timeout: Timeout,
    stats: &mut StatsSnapshot,
) -> io::Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let want = if length == 0 { 1 } else { length };
    with_timeout(timeout, fill_buffer(reader, buffered, want)).await?;

    if buffered.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed by peer",
        ));
    }

    let limit = if length == 0 { MAX_DELIVERY } else { length };
    let data = buffered.split_to(buffered.len().min(limit)).freeze();
    stats.recv_oct += data.len() as u64;
    stats.recv_cnt += 1;
    Ok(data)
}

/// Read into `buffered` until it holds `want` bytes or the peer hits EOF
///
/// `read_buf` only commits bytes once a read completes, so dropping this
/// future mid-read loses nothing.
async fn fill_buffer<R>(reader: &mut R, buffered: &mut BytesMut, want: usize) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    while buffered.len() < want {
        buffered.reserve(MAX_DELIVERY);
        if reader.read_buf(buffered).await? == 0 {
            break;
        }
    }
    Ok(())
}

/// Write every chunk of `data`, then flush
pub(crate) async fn write_data<W>(
    writer: &mut W,
    data: &IoData,
    stats: &mut StatsSnapshot,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for chunk in data.chunks() {
        writer.write_all(chunk).await?;
    }
    writer.flush().await?;

    stats.send_oct += data.len() as u64;
    stats.send_cnt += 1;
    Ok(())
}

/// Copy a region of a file to `writer`; `length == 0` copies to end of file
pub(crate) async fn copy_file_region<W>(
    writer: &mut W,
    path: &Path,
    offset: u64,
    length: u64,
    stats: &mut StatsSnapshot,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;

    let written = if length == 0 {
        tokio::io::copy(&mut file, writer).await?
    } else {
        tokio::io::copy(&mut file.take(length), writer).await?
    };
    writer.flush().await?;

    stats.send_oct += written;
    stats.send_cnt += 1;
    Ok(written)
}

fn unsupported(option: SocketOption) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("unsupported socket option: {option:?}"),
    )
}

/// Read the requested options from the TCP socket
pub(crate) fn get_options(
    stream: &TcpStream,
    options: &[SocketOption],
) -> io::Result<Vec<SocketOptionValue>> {
    let sock = SockRef::from(stream);
    options
        .iter()
        .map(|option| -> io::Result<SocketOptionValue> {
            Ok(match option {
                SocketOption::NoDelay => SocketOptionValue::NoDelay(stream.nodelay()?),
                SocketOption::KeepAlive => SocketOptionValue::KeepAlive(sock.keepalive()?),
                SocketOption::Linger => SocketOptionValue::Linger(sock.linger()?),
                SocketOption::RecvBuffer => SocketOptionValue::RecvBuffer(sock.recv_buffer_size()?),
                SocketOption::SendBuffer => SocketOptionValue::SendBuffer(sock.send_buffer_size()?),
                SocketOption::Ttl => SocketOptionValue::Ttl(stream.ttl()?),
                SocketOption::ReuseAddress => {
                    SocketOptionValue::ReuseAddress(sock.reuse_address()?)
                }
                SocketOption::Active => return Err(unsupported(*option)),
            })
        })
        .collect()
}

/// Apply options to the TCP socket, stopping at the first failure
pub(crate) fn set_options(stream: &TcpStream, options: &[SocketOptionValue]) -> io::Result<()> {
    let sock = SockRef::from(stream);
    for option in options {
        match *option {
            SocketOptionValue::NoDelay(on) => stream.set_nodelay(on)?,
            SocketOptionValue::KeepAlive(on) => sock.set_keepalive(on)?,
            SocketOptionValue::Linger(linger) => sock.set_linger(linger)?,
            SocketOptionValue::RecvBuffer(size) => sock.set_recv_buffer_size(size)?,
            SocketOptionValue::SendBuffer(size) => sock.set_send_buffer_size(size)?,
            SocketOptionValue::Ttl(ttl) => stream.set_ttl(ttl)?,
            SocketOptionValue::ReuseAddress(on) => sock.set_reuse_address(on)?,
            SocketOptionValue::Active(_) => return Err(unsupported(option.option())),
        }
    }
    Ok(())
}

/// Shut down one or both halves at the socket level
pub(crate) fn shutdown_socket(stream: &TcpStream, how: std::net::Shutdown) -> io::Result<()> {
    SockRef::from(stream).shutdown(how)
}

pub(crate) fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection closed")
}
