//! The public facade: one `Server` handle per remote game server, fronting
//! the query transport, the RCON client for its engine family, and an
//! optional subscription to a shared [`LogListener`].
//!
//! Adapted from the teacher crate's per-socket `examples/info.rs` demo in
//! spirit (own your connection state, reconnect lazily) but generalized
//! into a long-lived handle since RCON sessions and log subscriptions are
//! stateful across many calls, unlike a single A2S query.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::info::ServerInfo;
use crate::listener::LogListener;
use crate::log_event::Event;
use crate::player::PlayerResponse;
use crate::rcon::goldsrc::GoldSrcRcon;
use crate::rcon::source::SourceRcon;
use crate::rules::RulesResponse;
use crate::status::StatusInfo;
use crate::transport::{Engine, Transport};

const DEFAULT_TIMEOUT_MS: i64 = 5000;

/// Per-engine RCON state. A `Server` only ever holds the client for its own
/// engine, since the two protocols are not interchangeable.
enum Rcon {
    GoldSrc(RwLock<GoldSrcRcon>),
    Source(RwLock<SourceRcon>),
}

/// A subscriber callback invoked for every event the log listener routes to
/// this server.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

/// Handle to one remote GoldSrc/Source game server.
///
/// `remote`, `timeout_ms`, and the RCON password are individually
/// `RwLock`-guarded so they can be read or updated without taking a lock
/// over the whole handle; a bare unsynchronized field would not be
/// `Send + Sync`, which handles shared across threads need to be.
pub struct Server {
    remote: RwLock<SocketAddr>,
    engine: Engine,
    timeout_ms: RwLock<i64>,
    rcon: Rcon,
    subscribers: RwLock<Vec<EventHandler>>,
    disposed: RwLock<bool>,
}

impl Server {
    pub fn new(remote: SocketAddr, engine: Engine, rcon_password: impl Into<String>) -> Arc<Self> {
        let password = rcon_password.into();
        let rcon = match engine {
            Engine::GoldSrc => Rcon::GoldSrc(RwLock::new(GoldSrcRcon::new(remote, password, None))),
            Engine::Source => Rcon::Source(RwLock::new(SourceRcon::new(remote, password, None))),
        };

        Arc::new(Server {
            remote: RwLock::new(remote),
            engine,
            timeout_ms: RwLock::new(DEFAULT_TIMEOUT_MS),
            rcon,
            subscribers: RwLock::new(Vec::new()),
            disposed: RwLock::new(false),
        })
    }

    pub fn remote(&self) -> SocketAddr {
        *self.remote.read().unwrap()
    }

    pub fn set_remote(&self, remote: SocketAddr) {
        *self.remote.write().unwrap() = remote;
    }

    /// `0` or `-1` both mean "block forever"; any value below `-1` is
    /// rejected rather than silently clamped.
    pub fn set_timeout_ms(&self, timeout_ms: i64) -> Result<()> {
        if timeout_ms < -1 {
            return Err(Error::TimeoutOutOfRange(timeout_ms));
        }
        *self.timeout_ms.write().unwrap() = timeout_ms;
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        let ms = *self.timeout_ms.read().unwrap();
        if ms <= 0 {
            None
        } else {
            Some(Duration::from_millis(ms as u64))
        }
    }

    fn check_disposed(&self) -> Result<()> {
        if *self.disposed.read().unwrap() {
            return Err(Error::Disposed);
        }
        Ok(())
    }

    fn transport(&self) -> Transport {
        Transport::new(self.remote(), self.engine)
    }

    pub fn info(&self) -> Result<ServerInfo> {
        self.check_disposed()?;
        let (header, payload) = self.transport().info(self.timeout())?;
        match header {
            crate::packet::MessageHeader::InfoResponseSource => {
                crate::info::parse_source_info(&payload).map(ServerInfo::Source)
            }
            crate::packet::MessageHeader::InfoResponseGoldSource => {
                crate::info::parse_goldsrc_info(&payload).map(ServerInfo::GoldSrc)
            }
            other => Err(Error::Format(format!("unexpected info response header: {:?}", other))),
        }
    }

    pub fn players(&self) -> Result<PlayerResponse> {
        self.check_disposed()?;
        let payload = self.transport().player(self.timeout())?;
        crate::player::parse_player(&payload)
    }

    pub fn rules(&self) -> Result<RulesResponse> {
        self.check_disposed()?;
        let payload = self.transport().rules(self.timeout())?;
        crate::rules::parse_rules(&payload)
    }

    /// A2S_PING round-trip. Returns `false` on timeout rather than an error.
    pub fn ping(&self) -> Result<bool> {
        self.check_disposed()?;
        self.transport().ping(self.timeout())
    }

    pub fn status(&self) -> Result<StatusInfo> {
        self.check_disposed()?;
        let reply = self.rcon_query("status")?;
        crate::status::parse_status(&reply)
    }

    /// Execute an RCON command and return its textual reply, dispatching to
    /// whichever engine's client this handle was built with.
    pub fn rcon_query(&self, command: &str) -> Result<String> {
        self.check_disposed()?;
        match &self.rcon {
            Rcon::GoldSrc(client) => {
                let mut client = client.write().unwrap();
                client.challenge_rcon()?;
                client.query_rcon(command)
            }
            Rcon::Source(client) => {
                let mut client = client.write().unwrap();
                if !client.is_connected() {
                    client.connect_rcon()?;
                }
                client.query_rcon(command)
            }
        }
    }

    /// Subscribe `addr` as the log-listener key for this server, and attach
    /// a handler invoked for every event it receives.
    pub fn listen_for_logs(self: &Arc<Self>, listener: &LogListener, handler: EventHandler) {
        self.subscribers.write().unwrap().push(handler);
        listener.add_server(self.remote(), Arc::downgrade(self));
    }

    /// Called by the listener's reader thread for every event attributed to
    /// this server.
    pub(crate) fn emit(&self, event: Event) {
        for handler in self.subscribers.read().unwrap().iter() {
            handler(event.clone());
        }
    }

    /// Tear down RCON/log-listener state. Idempotent; further calls on a
    /// disposed handle return [`Error::Disposed`].
    pub fn dispose(&self) {
        *self.disposed.write().unwrap() = true;
        if let Rcon::Source(client) = &self.rcon {
            client.write().unwrap().disconnect_rcon();
        }
        self.subscribers.write().unwrap().clear();
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr() -> SocketAddr {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 27015)
    }

    #[test]
    fn rejects_timeout_below_negative_one() {
        let server = Server::new(addr(), Engine::Source, "pw");
        assert!(matches!(
            server.set_timeout_ms(-2),
            Err(Error::TimeoutOutOfRange(-2))
        ));
    }

    #[test]
    fn zero_and_negative_one_both_mean_infinite() {
        let server = Server::new(addr(), Engine::Source, "pw");
        server.set_timeout_ms(0).unwrap();
        assert!(server.timeout().is_none());
        server.set_timeout_ms(-1).unwrap();
        assert!(server.timeout().is_none());
    }

    #[test]
    fn disposed_handle_rejects_further_queries() {
        let server = Server::new(addr(), Engine::Source, "pw");
        server.dispose();
        assert!(matches!(server.info(), Err(Error::Disposed)));
    }
}
