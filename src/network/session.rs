//! Transport Session
//!
//! Owns the single TCP connection to the emulator for one client run.

use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::config::Config;
use crate::error::{EmuNwError, Result};
use crate::protocol::{write_frame, Frame};

/// Something frames can be written to and responses read from
pub trait Transport {
    /// Send one frame in full
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// One deadline-bounded read of whatever response bytes are available
    fn read_response(&mut self) -> Result<Bytes>;
}

/// A connected session with the emulator
pub struct Session {
    /// TCP stream
    stream: TcpStream,

    /// Peer address for logging
    peer_addr: SocketAddr,

    /// Deadline for each response read
    read_timeout: Duration,

    /// Cap on the bytes taken by one read
    buffer_size: usize,
}

impl Session {
    /// Resolve the configured address and connect
    pub fn connect(config: &Config) -> Result<Self> {
        config.validate()?;

        let addrs: Vec<SocketAddr> = config
            .server_addr
            .to_socket_addrs()
            .map_err(|e| EmuNwError::Resolution {
                addr: config.server_addr.clone(),
                reason: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(EmuNwError::Resolution {
                addr: config.server_addr.clone(),
                reason: "no addresses found".to_string(),
            });
        }
        tracing::debug!("Resolved {} to {:?}", config.server_addr, addrs);

        let stream =
            TcpStream::connect(&addrs[..]).map_err(|source| EmuNwError::Connection {
                addr: config.server_addr.clone(),
                source,
            })?;

        Self::configure(stream, config)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream, config: &Config) -> Result<Self> {
        config.validate()?;
        Self::configure(stream, config)
    }

    /// Apply socket options from an already validated config
    fn configure(stream: TcpStream, config: &Config) -> Result<Self> {
        let peer_addr = stream.peer_addr()?;

        // Commands are small; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(config.read_timeout()))?;
        stream.set_write_timeout(config.write_timeout())?;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            stream,
            peer_addr,
            read_timeout: config.read_timeout(),
            buffer_size: config.response_buffer_size,
        })
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Get the response buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Transport for Session {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        tracing::trace!("Writing {} byte frame to {}", frame.len(), self.peer_addr);
        write_frame(&mut self.stream, frame)
    }

    /// Performs exactly one read. A response longer than the buffer is
    /// truncated; the rest stays in the socket.
    fn read_response(&mut self) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(self.buffer_size);

        let n = loop {
            match self.stream.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    tracing::debug!(
                        "No response from {} within {:?}",
                        self.peer_addr,
                        self.read_timeout
                    );
                    return Err(EmuNwError::Timeout(self.read_timeout));
                }
                Err(e) => return Err(EmuNwError::Transport(e)),
            }
        };

        buf.truncate(n);
        tracing::trace!("Read {} bytes from {}", n, self.peer_addr);
        if n == self.buffer_size {
            tracing::warn!(
                "Response filled the {} byte buffer and may be truncated",
                self.buffer_size
            );
        }
        Ok(buf.freeze())
    }
}
