//! Source RCON: a stateful TCP session with an explicit auth handshake and
//! a flush-sentinel technique for collecting multi-packet responses.
//!
//! A single `SERVERDATA_EXECCOMMAND` can provoke more `RESPONSE_VALUE`
//! packets than fit in one TCP segment, and the protocol gives no length
//! prefix for "how many packets follow." The accepted trick (documented on
//! the Source RCON wiki, and followed here) is: after sending the real
//! command, send an empty `SERVERDATA_EXECCOMMAND` too and read packets
//! until one comes back whose id matches that empty command's id — every
//! `RESPONSE_VALUE` packet before it belongs to the real command.

use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::rcon::packet::{Packet, PacketType};

enum State {
    Disconnected,
    Authenticated(TcpStream),
}

/// A Source RCON session. Packet ids are monotonically increasing for the
/// lifetime of the session, not reset on each command.
pub struct SourceRcon {
    remote: SocketAddr,
    password: String,
    timeout: Option<Duration>,
    state: State,
    next_id: AtomicI32,
}

impl SourceRcon {
    pub fn new(remote: SocketAddr, password: impl Into<String>, timeout: Option<Duration>) -> Self {
        SourceRcon {
            remote,
            password: password.into(),
            timeout,
            state: State::Disconnected,
            next_id: AtomicI32::new(1),
        }
    }

    fn allocate_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Authenticated(_))
    }

    /// Open the TCP connection and perform the auth handshake. The server
    /// signals a rejected password by replying to auth with id `-1`.
    pub fn connect_rcon(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        log::debug!("rcon: connecting to {}", self.remote);
        let mut stream = TcpStream::connect(self.remote)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_nodelay(true)?;

        let auth_id = self.allocate_id();
        Packet::new(auth_id, PacketType::Auth, self.password.clone()).write_to(&mut stream)?;

        // The engine sends an empty RESPONSE_VALUE immediately before the
        // real auth response; read and discard it.
        let _ = Packet::read_from(&mut stream)?;
        let auth_response = Packet::read_from(&mut stream)?;

        if auth_response.id == -1 {
            log::warn!("rcon: auth rejected by {}", self.remote);
            return Err(Error::BadRconPassword);
        }

        log::debug!("rcon: authenticated with {}", self.remote);
        self.state = State::Authenticated(stream);
        Ok(())
    }

    pub fn disconnect_rcon(&mut self) {
        self.state = State::Disconnected;
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        match &mut self.state {
            State::Authenticated(stream) => Ok(stream),
            State::Disconnected => Err(Error::NotConnected),
        }
    }

    /// Execute `command` and collect the full (possibly multi-packet)
    /// response using the flush-sentinel technique.
    pub fn query_rcon(&mut self, command: &str) -> Result<String> {
        let command_id = self.allocate_id();
        let sentinel_id = self.allocate_id();

        {
            let stream = self.stream()?;
            Packet::new(command_id, PacketType::ExecCommand, command).write_to(stream)?;
            Packet::new(sentinel_id, PacketType::ExecCommand, "").write_to(stream)?;
        }

        let mut body = String::new();
        loop {
            let packet = match self.read_packet() {
                Ok(p) => p,
                Err(e) if e.is_timeout() => {
                    log::warn!("rcon: {} response collection timed out, returning partial reply", self.remote);
                    break;
                }
                Err(e) => return Err(e),
            };

            if packet.id == sentinel_id {
                break;
            }
            if packet.id == command_id || packet.id == -1 {
                body.push_str(&packet.body);
            }
            // A stray packet id (e.g. from a previous, abandoned command)
            // is ignored rather than treated as ending the response.
        }

        Ok(body)
    }

    fn read_packet(&mut self) -> Result<Packet> {
        let stream = self.stream()?;
        match Packet::read_from(stream) {
            Ok(packet) => Ok(packet),
            Err(e) => Err(map_read_error(e)),
        }
    }
}

fn map_read_error(e: Error) -> Error {
    if let Error::Io(io_err) = &e {
        if io_err.kind() == std::io::ErrorKind::UnexpectedEof {
            return Error::Timeout;
        }
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn fresh_session_is_not_connected() {
        let rcon = SourceRcon::new(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 27015), "x", None);
        assert!(!rcon.is_connected());
    }

    #[test]
    fn query_rcon_without_connecting_is_not_connected_error() {
        let mut rcon = SourceRcon::new(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 27015), "x", None);
        assert!(matches!(rcon.query_rcon("status"), Err(Error::NotConnected)));
    }

    #[test]
    fn packet_ids_are_monotonic_across_allocations() {
        let rcon = SourceRcon::new(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 27015), "x", None);
        let a = rcon.allocate_id();
        let b = rcon.allocate_id();
        assert!(b > a);
    }
}
