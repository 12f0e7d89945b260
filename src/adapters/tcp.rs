//! TCP socket adapter.
//!
//! Implements [`NetworkPort`], [`ListenerPort`] and [`ConnectionPort`] over
//! `std::net`, which ESP-IDF's lwIP-backed std target provides as well, so
//! the same code runs on the device and on the host.
//!
//! ## Accept timeout
//!
//! `std::net::TcpListener` has no accept timeout, so the listener is put in
//! non-blocking mode and polled in short slices until the configured timeout
//! elapses.  An elapsed timeout returns `Ok(None)`.
//!
//! Accepted streams are switched back to blocking mode with read and write
//! timeouts equal to the accept timeout, so a stalled client cannot hold the
//! single-threaded server forever.

use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::ports::{ConnectionPort, ListenerPort, NetError, NetworkPort};

/// Sleep between non-blocking accept attempts.
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Floor for per-connection read/write timeouts; std rejects a zero timeout.
const MIN_IO_TIMEOUT: Duration = Duration::from_millis(10);

/// Factory for [`TcpListenerAdapter`]s.
#[derive(Debug, Default)]
pub struct TcpNetwork;

impl TcpNetwork {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkPort for TcpNetwork {
    type Listener = TcpListenerAdapter;

    fn bind(&mut self, port: u16, accept_timeout: Duration) -> Result<TcpListenerAdapter, NetError> {
        let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("tcp: bind {} failed: {}", addr, e);
            NetError::Bind("bind")
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| NetError::Bind("set_nonblocking"))?;
        let local = listener.local_addr().map_err(|_| NetError::Bind("local_addr"))?;
        info!("tcp: listening on {}", local);
        Ok(TcpListenerAdapter {
            listener: Some(listener),
            local,
            accept_timeout,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Listener
// ───────────────────────────────────────────────────────────────

pub struct TcpListenerAdapter {
    /// `None` once closed.
    listener: Option<TcpListener>,
    local: SocketAddr,
    accept_timeout: Duration,
}

impl TcpListenerAdapter {
    /// Bound address (useful when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    pub fn is_open(&self) -> bool {
        self.listener.is_some()
    }

    fn prepare(&self, stream: &TcpStream) -> std::io::Result<()> {
        let timeout = self.accept_timeout.max(MIN_IO_TIMEOUT);
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))
    }
}

impl ListenerPort for TcpListenerAdapter {
    type Connection = TcpConnection;

    fn accept(&mut self) -> Result<Option<TcpConnection>, NetError> {
        let listener = self.listener.as_ref().ok_or(NetError::Closed)?;
        let deadline = Instant::now() + self.accept_timeout;
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!("tcp: client {}", peer);
                    self.prepare(&stream).map_err(|_| NetError::Accept("configure stream"))?;
                    return Ok(Some(TcpConnection { stream, peer }));
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("tcp: accept error: {}", e);
                    return Err(NetError::Accept("accept"));
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), NetError> {
        if self.listener.take().is_some() {
            info!("tcp: listener on {} closed", self.local);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Connection
// ───────────────────────────────────────────────────────────────

pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpConnection {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl ConnectionPort for TcpConnection {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        self.stream.read(buf).map_err(|e| {
            warn!("tcp: recv from {} failed: {}", self.peer, e);
            NetError::Io("recv")
        })
    }

    fn send_all(&mut self, data: &[u8]) -> Result<(), NetError> {
        self.stream.write_all(data).map_err(|e| {
            warn!("tcp: send to {} failed: {}", self.peer, e);
            NetError::Io("send")
        })
    }

    fn close(mut self) -> Result<(), NetError> {
        self.stream.flush().map_err(|_| NetError::Io("flush"))?;
        // The peer may already be gone; dropping the stream closes it anyway.
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        Ok(())
    }
}
