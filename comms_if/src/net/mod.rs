//! # Networking module
//!
//! Provides a monitored, line-oriented TCP socket. Outbound lines are written directly on the
//! caller's thread, inbound lines are read by a background thread and placed in a mailbox which
//! the caller drains without blocking.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of unread lines the mailbox holds, further lines are dropped until it is drained.
pub const MAILBOX_CAPACITY: usize = 256;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A TCP socket exchanging newline terminated text lines.
///
/// The connection state is monitored: a failed write or a closed/failed read marks the socket
/// as disconnected, after which every send returns `LineSocketError::NotConnected`. Lines which
/// aren't valid UTF-8 are decoded lossily and delivered, they never affect the connection.
pub struct LineSocket {
    stream: TcpStream,

    peer: SocketAddr,

    /// Inbound lines from the reader thread
    mailbox: Receiver<String>,

    reader_handle: Option<JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>,
}

/// Options for the line socket.
#[derive(Debug, Clone, Copy)]
pub struct SocketOptions {
    /// Timeout for establishing the connection in milliseconds, 0 waits forever
    pub connect_timeout_ms: u64,

    /// Timeout for a single write in milliseconds, 0 waits forever
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm so commands go out immediately
    pub nodelay: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LineSocketError {
    #[error("Could not resolve the address {0}")]
    AddrResolveError(String),

    #[error("Could not connect to {0}: {1}")]
    CouldNotConnect(String, std::io::Error),

    #[error("Could not set socket option: {0}")]
    SockOptError(std::io::Error),

    #[error("Could not start the reader thread: {0}")]
    ReaderSpawnError(std::io::Error),

    #[error("Lines may not contain a line terminator")]
    EmbeddedNewline,

    #[error("The socket is not connected")]
    NotConnected,

    #[error("Could not write to the socket: {0}")]
    WriteError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LineSocket {
    /// Connect to the given `host:port` endpoint.
    pub fn connect(
        endpoint: &str,
        options: SocketOptions
    ) -> Result<Self, LineSocketError> {
        // Resolve the endpoint, take the first address
        let peer = endpoint
            .to_socket_addrs()
            .map_err(|_| LineSocketError::AddrResolveError(endpoint.into()))?
            .next()
            .ok_or_else(|| LineSocketError::AddrResolveError(endpoint.into()))?;

        let stream = match options.connect_timeout_ms {
            0 => TcpStream::connect(peer),
            t => TcpStream::connect_timeout(&peer, Duration::from_millis(t))
        }.map_err(|e| LineSocketError::CouldNotConnect(endpoint.into(), e))?;

        Self::from_stream(stream, options)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(
        stream: TcpStream,
        options: SocketOptions
    ) -> Result<Self, LineSocketError> {
        stream
            .set_nodelay(options.nodelay)
            .map_err(LineSocketError::SockOptError)?;
        stream
            .set_write_timeout(match options.write_timeout_ms {
                0 => None,
                t => Some(Duration::from_millis(t))
            })
            .map_err(LineSocketError::SockOptError)?;

        let peer = stream.peer_addr().map_err(LineSocketError::SockOptError)?;
        let read_stream = stream.try_clone().map_err(LineSocketError::SockOptError)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(true));
        let (tx, rx) = sync_channel(MAILBOX_CAPACITY);

        // Create clones for use by the reader thread
        let shutdown_clone = shutdown.clone();
        let connected_clone = connected.clone();

        let reader_handle = thread::Builder::new()
            .name(format!("line_reader_{}", peer))
            .spawn(move || read_lines(read_stream, tx, shutdown_clone, connected_clone))
            .map_err(LineSocketError::ReaderSpawnError)?;

        debug!("Line socket connected to {}", peer);

        Ok(Self {
            stream,
            peer,
            mailbox: rx,
            reader_handle: Some(reader_handle),
            shutdown,
            connected
        })
    }

    /// Return if the socket is connected or not.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// The address of the remote end.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send a single line, the terminator is appended here.
    pub fn send_line(&mut self, line: &str) -> Result<(), LineSocketError> {
        if line.contains('\n') || line.contains('\r') {
            return Err(LineSocketError::EmbeddedNewline)
        }

        if !self.connected() {
            return Err(LineSocketError::NotConnected)
        }

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        match self.stream.write_all(&buf).and_then(|_| self.stream.flush()) {
            Ok(_) => {
                trace!("-> {}: {}", self.peer, line);
                Ok(())
            },
            Err(e) => {
                self.connected.store(false, Ordering::Relaxed);
                Err(LineSocketError::WriteError(e))
            }
        }
    }

    /// Take the oldest received line, if there is one. Never blocks.
    pub fn try_recv_line(&mut self) -> Option<String> {
        match self.mailbox.try_recv() {
            Ok(l) => Some(l),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.connected.store(false, Ordering::Relaxed);
                None
            }
        }
    }
}

impl Drop for LineSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Shutting down the stream unblocks the reader
        self.stream.shutdown(Shutdown::Both).ok();

        if let Some(jh) = self.reader_handle.take() {
            if jh.join().is_err() {
                warn!("Line reader thread for {} panicked", self.peer);
            }
        }
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            write_timeout_ms: 100,
            nodelay: true
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn read_lines(
    stream: TcpStream,
    mailbox: SyncSender<String>,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>
) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();

        match reader.read_until(b'\n', &mut buf) {
            // EOF, the peer has gone
            Ok(0) => break,
            Ok(_) => (),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                if !shutdown.load(Ordering::Relaxed) {
                    warn!("Error reading from line socket: {}", e);
                }
                break;
            }
        }

        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(&['\r', '\n'][..])
            .to_string();

        match mailbox.try_send(line) {
            Ok(_) => (),
            Err(TrySendError::Full(l)) => debug!("Line mailbox full, dropping \"{}\"", l),
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    connected.store(false, Ordering::Relaxed);
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    fn wait_for_line(socket: &mut LineSocket) -> Option<String> {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(2) {
            if let Some(l) = socket.try_recv_line() {
                return Some(l)
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_line_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);

            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            writer.write_all(b"stalled inner\nstalled outer\n").unwrap();
            line
        });

        let mut socket = LineSocket::connect(&addr.to_string(), SocketOptions::default())
            .unwrap();
        assert!(socket.connected());

        socket.send_line("move 240").unwrap();
        assert_eq!(server.join().unwrap(), "move 240\n");

        assert_eq!(wait_for_line(&mut socket).as_deref(), Some("stalled inner"));
        assert_eq!(wait_for_line(&mut socket).as_deref(), Some("stalled outer"));
    }

    #[test]
    fn test_invalid_utf8_line_ignored() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            writer.write_all(b"\xff\xfe garbage\nstalled inner\r\n").unwrap();

            // Hold the connection open until the client has answered
            let mut line = String::new();
            BufReader::new(stream).read_line(&mut line).unwrap();
            line
        });

        let mut socket = LineSocket::connect(&addr.to_string(), SocketOptions::default())
            .unwrap();

        let garbage = wait_for_line(&mut socket).unwrap();
        assert!(garbage.ends_with(" garbage"));
        assert_eq!(wait_for_line(&mut socket).as_deref(), Some("stalled inner"));

        // The link is still usable
        assert!(socket.connected());
        socket.send_line("move 0").unwrap();
        assert_eq!(server.join().unwrap(), "move 0\n");
    }

    #[test]
    fn test_full_mailbox_drops_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            for i in 0..(MAILBOX_CAPACITY + 50) {
                writeln!(stream, "line {}", i).unwrap();
            }
        });

        let mut socket = LineSocket::connect(&addr.to_string(), SocketOptions::default())
            .unwrap();
        server.join().unwrap();

        // The reader is done once it has seen the server hang up
        let start = Instant::now();
        while socket.connected() && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }

        let mut lines = vec![];
        while let Some(l) = socket.try_recv_line() {
            lines.push(l);
        }

        assert_eq!(lines.len(), MAILBOX_CAPACITY);
        assert_eq!(lines[0], "line 0");
    }

    #[test]
    fn test_embedded_newline_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || listener.accept().map(|_| ()));

        let mut socket = LineSocket::connect(&addr.to_string(), SocketOptions::default())
            .unwrap();
        assert!(matches!(
            socket.send_line("move 1\nmove 2"),
            Err(LineSocketError::EmbeddedNewline)
        ));

        server.join().unwrap().unwrap();
    }

    #[test]
    fn test_peer_close_disconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let socket = LineSocket::connect(&addr.to_string(), SocketOptions::default())
            .unwrap();
        server.join().unwrap();

        let start = Instant::now();
        while socket.connected() && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!socket.connected());
    }
}
