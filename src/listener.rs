//! Shared UDP listener for game-server log streams.
//!
//! One bound socket serves every server that has had its log output
//! redirected here via `logaddress_add`; incoming datagrams are routed by
//! source address to the matching [`crate::server::Server`] handle.
//! Adapted in structure from the teacher crate's connected-per-request
//! socket pattern, generalized here into a background reader thread since
//! the listener has to keep receiving between calls rather than make one
//! request/response round trip.

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, RwLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::log_event::{self, Event};
use crate::server::Server;

/// Registry of servers currently subscribed to this listener's socket,
/// keyed by the address datagrams arrive from. Held as `Weak` so the
/// listener never keeps a `Server` alive on its own — ownership stays with
/// the application, breaking the listener/server reference cycle.
type Registry = Arc<RwLock<HashMap<SocketAddr, Weak<Server>>>>;

/// Delivered on the exception channel when a datagram can't be turned into
/// an event, so one unparseable line doesn't silently vanish.
#[derive(Debug)]
pub struct ListenerException {
    pub source: SocketAddr,
    pub error: Error,
}

/// A UDP socket shared by every server whose logs are routed to the same
/// local endpoint.
pub struct LogListener {
    bind_addr: SocketAddr,
    registry: Registry,
    socket: RwLock<Option<UdpSocket>>,
    stop_flag: Arc<AtomicBool>,
    reader: RwLock<Option<JoinHandle<()>>>,
    exceptions: (mpsc::Sender<ListenerException>, RwLock<mpsc::Receiver<ListenerException>>),
}

impl LogListener {
    pub fn new(bind_addr: SocketAddr) -> Self {
        let (tx, rx) = mpsc::channel();
        LogListener {
            bind_addr,
            registry: Arc::new(RwLock::new(HashMap::new())),
            socket: RwLock::new(None),
            stop_flag: Arc::new(AtomicBool::new(false)),
            reader: RwLock::new(None),
            exceptions: (tx, RwLock::new(rx)),
        }
    }

    /// Register `server` as the handler for datagrams from `remote`. Does
    /// not itself start the listener; call [`LogListener::listen`] once.
    pub fn add_server(&self, remote: SocketAddr, server: Weak<Server>) {
        self.registry.write().unwrap().insert(remote, server);
    }

    pub fn remove_server(&self, remote: SocketAddr) {
        self.registry.write().unwrap().remove(&remote);
    }

    /// Bind the socket and start the background reader thread.
    pub fn listen(&self) -> Result<()> {
        if self.socket.read().unwrap().is_some() {
            return Err(Error::AlreadyListening);
        }

        let socket = UdpSocket::bind(self.bind_addr)?;
        socket.set_read_timeout(Some(Duration::from_millis(250)))?;
        let reader_socket = socket.try_clone()?;
        *self.socket.write().unwrap() = Some(socket);
        log::debug!("log listener: bound {}", self.bind_addr);

        self.stop_flag.store(false, Ordering::SeqCst);
        let stop_flag = Arc::clone(&self.stop_flag);
        let registry = Arc::clone(&self.registry);
        let exception_tx = self.exceptions.0.clone();

        let handle = thread::spawn(move || {
            read_loop(reader_socket, registry, stop_flag, exception_tx);
        });
        *self.reader.write().unwrap() = Some(handle);

        Ok(())
    }

    /// Stop the reader thread and release the socket. Idempotent.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader.write().unwrap().take() {
            let _ = handle.join();
        }
        *self.socket.write().unwrap() = None;
    }

    pub fn is_listening(&self) -> bool {
        self.socket.read().unwrap().is_some()
    }

    /// Drain any exceptions raised by the reader thread since the last call.
    pub fn drain_exceptions(&self) -> Vec<ListenerException> {
        self.exceptions.1.read().unwrap().try_iter().collect()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

impl Drop for LogListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(
    socket: UdpSocket,
    registry: Registry,
    stop_flag: Arc<AtomicBool>,
    exceptions: mpsc::Sender<ListenerException>,
) {
    let mut buf = [0u8; 4096];
    while !stop_flag.load(Ordering::SeqCst) {
        let (n, source) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                continue;
            }
            Err(_) => break,
        };

        let server = registry.read().unwrap().get(&source).cloned();
        let Some(server) = server.and_then(|w| w.upgrade()) else {
            log::trace!("log listener: dropping datagram from unregistered {}", source);
            continue;
        };

        // Valve's log protocol prefixes every datagram with a 4-byte
        // 0xFFFFFFFF marker, matching the A2S single-packet header, then an
        // optional sequence id byte before the textual payload.
        let text = strip_datagram_prefix(&buf[..n]);
        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match log_event::parse_line(line) {
                Ok(Some(event)) => dispatch(&server, event),
                Ok(None) => {}
                Err(error) => {
                    log::warn!("log listener: unparseable line from {}: {:?}", source, error);
                    let _ = exceptions.send(ListenerException { source, error });
                }
            }
        }
    }
}

fn strip_datagram_prefix(datagram: &[u8]) -> std::borrow::Cow<'_, str> {
    let body = if datagram.starts_with(&[0xFF, 0xFF, 0xFF, 0xFF]) {
        &datagram[4..]
    } else {
        datagram
    };
    let body = if body.first() == Some(&b'S') { &body[1..] } else { body };
    String::from_utf8_lossy(body)
}

fn dispatch(server: &Arc<Server>, event: Event) {
    server.emit(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_marker_and_sequence_byte() {
        let mut datagram = vec![0xFF, 0xFF, 0xFF, 0xFF, b'S'];
        datagram.extend_from_slice(b"L 04/22/2024 - 18:00:00: Log file closed\n");
        let text = strip_datagram_prefix(&datagram);
        assert!(text.starts_with("L 04/22/2024"));
    }

    #[test]
    fn passes_through_datagrams_without_marker() {
        let datagram = b"L 04/22/2024 - 18:00:00: Log file closed\n".to_vec();
        let text = strip_datagram_prefix(&datagram);
        assert!(text.starts_with("L 04/22/2024"));
    }
}
