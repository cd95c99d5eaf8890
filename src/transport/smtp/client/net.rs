use std::{
    fmt,
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use super::MockStream;
use crate::transport::smtp::{error, Error};

/// A network stream
pub struct NetworkStream {
    inner: InnerNetworkStream,
}

/// Represents the different types of underlying network streams
enum InnerNetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Mock stream
    Mock(MockStream),
}

impl fmt::Debug for NetworkStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            InnerNetworkStream::Tcp(ref s) => f.debug_tuple("Tcp").field(s).finish(),
            InnerNetworkStream::Mock(ref s) => f.debug_tuple("Mock").field(s).finish(),
        }
    }
}

impl NetworkStream {
    fn new(inner: InnerNetworkStream) -> Self {
        NetworkStream { inner }
    }

    /// Wraps a mock stream
    pub fn new_mock(mock: MockStream) -> Self {
        Self::new(InnerNetworkStream::Mock(mock))
    }

    /// Returns peer's address
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self.inner {
            InnerNetworkStream::Tcp(ref s) => s.peer_addr(),
            InnerNetworkStream::Mock(_) => Ok(SocketAddr::from(([127, 0, 0, 1], 80))),
        }
    }

    /// Shutdowns the connection
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref s) => s.shutdown(how),
            InnerNetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Opens a TCP connection, trying every resolved address in turn
    ///
    /// Each attempt is bounded by `timeout` when there is one.
    pub fn connect<T: ToSocketAddrs>(
        server: T,
        timeout: Option<Duration>,
    ) -> Result<NetworkStream, Error> {
        fn try_connect(addr: &SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
            match timeout {
                Some(t) => TcpStream::connect_timeout(addr, t),
                None => TcpStream::connect(addr),
            }
        }

        let addrs = server.to_socket_addrs().map_err(error::connection)?;

        let mut last_err = None;
        for addr in addrs {
            match try_connect(&addr, timeout) {
                Ok(stream) => return Ok(NetworkStream::new(InnerNetworkStream::Tcp(stream))),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("could not connect to {addr}: {err}");
                    last_err = Some(err);
                }
            }
        }

        Err(match last_err {
            Some(last_err) => error::connection(last_err),
            None => error::connection("could not resolve to any supported address"),
        })
    }

    /// Set read timeout for IO calls
    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut stream) => stream.set_read_timeout(duration),
            InnerNetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Set write timeout for IO calls
    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut stream) => stream.set_write_timeout(duration),
            InnerNetworkStream::Mock(_) => Ok(()),
        }
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut s) => s.read(buf),
            InnerNetworkStream::Mock(ref mut s) => s.read(buf),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut s) => s.write(buf),
            InnerNetworkStream::Mock(ref mut s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner {
            InnerNetworkStream::Tcp(ref mut s) => s.flush(),
            InnerNetworkStream::Mock(ref mut s) => s.flush(),
        }
    }
}
