//! # Mechanisms Client
//!
//! This module provides the link to the actuator controller. Commands are sent as text lines
//! and status lines are read from a mailbox filled by the socket's reader thread.
//!
//! The client can also be created disabled, for running without the vehicle. A disabled client
//! accepts every command and never reports any status.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, trace, warn};
use std::collections::VecDeque;

use comms_if::{
    eqpt::{ActCmd, ActStatus},
    net::{LineSocket, LineSocketError, SocketOptions},
};

use crate::{nav_ctrl::ActLink, params::NavExecParams};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Most statuses kept between polls, the oldest are dropped beyond this.
const MAX_PENDING_STATUSES: usize = 8;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct MechClient {
    socket: Option<LineSocket>,

    /// Recognised statuses not yet handed out
    pending: VecDeque<ActStatus>,

    /// Set once the loss of the link has been reported
    lost_reported: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MechClientError {
    #[error("Socket error: {0}")]
    SocketError(LineSocketError),

    #[error("The client is not connected to the actuator controller")]
    NotConnected,

    #[error("Could not send command to the actuator controller: {0}")]
    SendError(LineSocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MechClient {
    /// Connect to the actuator controller given in the parameters.
    pub fn connect(params: &NavExecParams) -> Result<Self, MechClientError> {
        let options = SocketOptions {
            connect_timeout_ms: params.act_connect_timeout_ms,
            write_timeout_ms: params.act_write_timeout_ms,
            nodelay: true,
        };

        let endpoint = format!("{}:{}", params.act_host, params.act_port);

        let socket = LineSocket::connect(&endpoint, options)
            .map_err(MechClientError::SocketError)?;

        info!("Connected to the actuator controller at {}", socket.peer());

        Ok(Self {
            socket: Some(socket),
            pending: VecDeque::new(),
            lost_reported: false,
        })
    }

    /// Create a client which is not connected to anything.
    pub fn disabled() -> Self {
        Self {
            socket: None,
            pending: VecDeque::new(),
            lost_reported: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.socket.is_some()
    }

    /// Return if the client is connected or not, a disabled client is never connected.
    pub fn is_connected(&self) -> bool {
        match self.socket {
            Some(ref s) => s.connected(),
            None => false,
        }
    }

    /// Check the link and report its loss once.
    fn link_up(&mut self) -> bool {
        let up = self.is_connected();

        if !up && !self.lost_reported {
            error!("Connection to the actuator controller lost, commands will be dropped");
            self.lost_reported = true;
        }

        up
    }
}

impl ActLink for MechClient {
    fn send(&mut self, cmd: ActCmd) -> Result<(), MechClientError> {
        if !self.link_up() {
            return Ok(());
        }

        match self.socket {
            Some(ref mut s) => s.send_line(&cmd.to_line()).map_err(MechClientError::SendError),
            None => Ok(()),
        }
    }

    fn poll_status(&mut self) -> Result<Option<ActStatus>, MechClientError> {
        // Drain everything received so far, only the statuses are kept
        if let Some(socket) = self.socket.as_mut() {
            while let Some(line) = socket.try_recv_line() {
                match ActStatus::from_line(&line) {
                    Some(status) => {
                        if self.pending.len() >= MAX_PENDING_STATUSES {
                            warn!("Too many unhandled actuator statuses, dropping the oldest");
                            self.pending.pop_front();
                        }
                        self.pending.push_back(status);
                    },
                    None => trace!("Ignoring actuator controller line \"{}\"", line),
                }
            }
        }

        Ok(self.pending.pop_front())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::{Duration, Instant};

    fn params(port: u16) -> NavExecParams {
        NavExecParams {
            act_host: "127.0.0.1".into(),
            act_port: port,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_client() {
        let mut client = MechClient::disabled();

        assert!(!client.is_enabled());
        assert!(!client.is_connected());
        assert!(client.send(ActCmd::STOP).is_ok());
        assert!(matches!(client.poll_status(), Ok(None)));
    }

    #[test]
    fn test_commands_and_status() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);

            let mut lines = vec![];
            for _ in 0..2 {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                lines.push(line);
            }

            writer.write_all(b"battery low\nstalled outer\n").unwrap();
            lines
        });

        let mut client = MechClient::connect(&params(port)).unwrap();
        assert!(client.is_connected());

        client.send(ActCmd::Turn { angle_deg: -12, speed: 120 }).unwrap();
        client.send(ActCmd::Collect { inner_speed: 200, outer_speed: 500 }).unwrap();

        assert_eq!(
            server.join().unwrap(),
            vec!["turn -12 120\n".to_string(), "collect 200 500\n".to_string()]
        );

        // The unknown line is skipped over
        let mut statuses = vec![];
        let start = Instant::now();
        while statuses.is_empty() && start.elapsed() < Duration::from_secs(2) {
            if let Some(s) = client.poll_status().unwrap() {
                statuses.push(s);
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(statuses, vec![ActStatus::StalledOuter]);
    }

    #[test]
    fn test_chatter_is_drained() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            for i in 0..100 {
                writeln!(stream, "battery {}", i).unwrap();
            }
            stream.write_all(b"stalled inner\nstalled outer\n").unwrap();
        });

        let mut client = MechClient::connect(&params(port)).unwrap();
        server.join().unwrap();

        // Wait for the reader to see the hang up, by then every line is in the mailbox
        let start = Instant::now();
        while client.is_connected() && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }

        // One poll gets past all the chatter, and the second status waits for the next poll
        assert_eq!(client.poll_status().unwrap(), Some(ActStatus::StalledInner));
        assert_eq!(client.poll_status().unwrap(), Some(ActStatus::StalledOuter));
        assert_eq!(client.poll_status().unwrap(), None);
    }

    #[test]
    fn test_connect_failure() {
        // Bind then drop to get a port nobody is listening on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        assert!(matches!(
            MechClient::connect(&params(port)),
            Err(MechClientError::SocketError(_))
        ));
    }
}
