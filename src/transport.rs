use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        source: io::Error,
    },

    #[error("Failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// An open byte-stream connection to a mail server.
///
/// The connection is closed when the transport is dropped, so every exit
/// path out of a send releases the socket.
pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// Opens transport connections. The SMTP session depends on this
/// capability rather than on the OS socket layer directly, so tests can
/// substitute a scripted transport.
pub trait TransportProvider {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Transport>, TransportError>;
}

/// Plain TCP transport over a blocking `TcpStream`.
pub struct TcpTransport {
    stream: TcpStream,
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(bytes.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(self.stream.read(buf)?)
    }
}

/// Connects plain TCP streams, applying its timeout policy to connect,
/// read and write. `None` disables timeouts entirely.
pub struct TcpTransportProvider {
    timeout: Option<Duration>,
}

impl TcpTransportProvider {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self {
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Default for TcpTransportProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportProvider for TcpTransportProvider {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Transport>, TransportError> {
        let mut addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve {
                host: host.to_string(),
                source: e,
            })?;

        let addr = addrs.next().ok_or_else(|| TransportError::Resolve {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        })?;

        let connect_result = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        let stream = connect_result.map_err(|e| TransportError::Connect {
            host: host.to_string(),
            port,
            source: e,
        })?;

        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        Ok(Box::new(TcpTransport { stream }))
    }
}
