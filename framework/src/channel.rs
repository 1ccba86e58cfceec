/// Byte-stream transport used by the telemetry loop
/// Low latency TCP: Nagle off, bounded write time
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::info;
use thiserror::Error;

/// Connected, ordered, reliable byte stream
pub trait Channel {
    /// Send one message; returns the number of bytes accepted
    fn send(&mut self, bytes: &[u8]) -> Result<usize, ChannelError>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, bytes: &[u8]) -> Result<usize, ChannelError> {
        (**self).send(bytes)
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("send timed out")]
    Timeout,
    #[error("transport accepted no bytes")]
    Closed,
    #[error("transport error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ChannelError::Timeout,
            io::ErrorKind::WriteZero => ChannelError::Closed,
            _ => ChannelError::Io(err),
        }
    }
}

pub struct TcpChannel {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpChannel {
    /// Connect and configure the socket for telemetry
    ///
    /// `send_timeout` bounds every send so a stalled peer cannot hold the
    /// sensor loop. A zero duration is rejected by the OS, use a positive
    /// value.
    pub fn connect<A: ToSocketAddrs>(addr: A, send_timeout: Duration) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream, send_timeout)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream, send_timeout: Duration) -> Result<Self, ChannelError> {
        stream.set_nodelay(true)?; // Disable Nagle's algorithm for low latency
        stream.set_write_timeout(Some(send_timeout))?;
        let peer = stream.peer_addr()?;
        info!(
            "Telemetry channel connected to {} (send timeout {} ms)",
            peer,
            send_timeout.as_millis()
        );
        Ok(Self { stream, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Shut both directions down; later sends fail
    pub fn close(&self) -> Result<(), ChannelError> {
        self.stream.shutdown(Shutdown::Both)?;
        Ok(())
    }
}

impl Channel for TcpChannel {
    /// Write the whole record or fail
    ///
    /// A timeout can hit after part of the record is already on the wire.
    /// The tick still counts as dropped, while the peer sees a fragment;
    /// with newline framing that fragment may be a full record minus its
    /// `\n`. Consumers resync on the next `{`, see `TelemetryDecoder`.
    fn send(&mut self, bytes: &[u8]) -> Result<usize, ChannelError> {
        self.stream.write_all(bytes)?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn test_io_error_classification() {
        let timeout: ChannelError = io::Error::from(io::ErrorKind::TimedOut).into();
        assert!(matches!(timeout, ChannelError::Timeout));

        let would_block: ChannelError = io::Error::from(io::ErrorKind::WouldBlock).into();
        assert!(matches!(would_block, ChannelError::Timeout));

        let zero: ChannelError = io::Error::from(io::ErrorKind::WriteZero).into();
        assert!(matches!(zero, ChannelError::Closed));

        let reset: ChannelError = io::Error::from(io::ErrorKind::ConnectionReset).into();
        assert!(matches!(reset, ChannelError::Io(_)));
    }

    #[test]
    fn test_io_error_keeps_its_source() {
        use std::error::Error as _;

        let err: ChannelError = io::Error::new(io::ErrorKind::ConnectionReset, "peer gone").into();
        let source = err.source().expect("io error in the chain");
        assert_eq!(source.to_string(), "peer gone");
    }

    #[test]
    fn test_tcp_channel_delivers_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut channel = TcpChannel::connect(addr, Duration::from_millis(100)).unwrap();
        let (mut server, _) = listener.accept().unwrap();
        assert_eq!(channel.peer_addr(), addr);

        let sent = channel.send(b"{\"s\":1}").unwrap();
        assert_eq!(sent, 7);
        channel.close().unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"{\"s\":1}");
    }
}
