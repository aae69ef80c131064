//! GoldSrc RCON: connectionless UDP, challenge-then-command.
//!
//! Every command needs a fresh challenge value fetched with
//! `challenge rcon`, then the command itself is sent as
//! `rcon <challenge> "<password>" <command>` and the server answers with one
//! or more plain-text datagrams prefixed the same way A2S responses are
//! (`0xFFFFFFFF` single packet). There is no persistent session: a bad
//! challenge or a wrong password just gets a textual rejection back
//! (`bad challenge.` / `bad rcon_password.`), so `query_rcon` surfaces those
//! as `Error::BadRconChallenge`/`Error::BadRconPassword` by inspecting the
//! reply rather than through any dedicated handshake step.

use std::net::{SocketAddr, UdpSocket};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;

use crate::error::{Error, Result};
use crate::wire;

const CHALLENGE_REQUEST: &[u8] = b"\xff\xff\xff\xffchallenge rcon\n";

fn challenge_reply_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"challenge rcon (?P<challenge>\d+)").unwrap())
}

fn log_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"current:\s+(?P<addr>\S+:\d+)").unwrap())
}

/// A GoldSrc RCON session. Holds no socket between calls; `challenge_rcon`
/// must be called (or re-called after it expires server-side) before
/// `send_rcon`/`query_rcon` will be accepted.
pub struct GoldSrcRcon {
    remote: SocketAddr,
    password: String,
    timeout: Option<Duration>,
    challenge: Option<String>,
}

impl GoldSrcRcon {
    pub fn new(remote: SocketAddr, password: impl Into<String>, timeout: Option<Duration>) -> Self {
        GoldSrcRcon {
            remote,
            password: password.into(),
            timeout,
            challenge: None,
        }
    }

    fn socket(&self) -> Result<UdpSocket> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(self.remote)?;
        socket.set_read_timeout(self.timeout)?;
        Ok(socket)
    }

    /// Fetch (or refresh) the challenge value required by every subsequent
    /// command on this session.
    pub fn challenge_rcon(&mut self) -> Result<()> {
        let socket = self.socket()?;
        socket.send(CHALLENGE_REQUEST)?;

        let mut buf = [0u8; 1400];
        let n = socket.recv(&mut buf)?;
        let reply = String::from_utf8_lossy(&buf[4..n]);

        let challenge = challenge_reply_re()
            .captures(reply.trim())
            .and_then(|caps| caps.name("challenge"))
            .ok_or(Error::BadRconChallenge)?
            .as_str()
            .to_string();
        log::debug!("rcon: got challenge {} from {}", challenge, self.remote);
        self.challenge = Some(challenge);
        Ok(())
    }

    fn command_datagram(&self, command: &str) -> Result<Vec<u8>> {
        let challenge = self.challenge.as_deref().ok_or(Error::BadRconChallenge)?;
        let body = format!(
            "rcon {} \"{}\" {}\n",
            challenge, self.password, command
        );
        Ok(wire::concat(&[&[0xff, 0xff, 0xff, 0xff], body.as_bytes()]))
    }

    /// Fire-and-forget: send the command without waiting for (or caring
    /// about) any reply. Used for commands whose side effect matters more
    /// than their textual response, e.g. repeated log-address churn.
    pub fn send_rcon(&self, command: &str) -> Result<()> {
        let socket = self.socket()?;
        socket.send(&self.command_datagram(command)?)?;
        Ok(())
    }

    /// Send a command and collect every reply datagram the server sends
    /// back within the timeout window, concatenated in arrival order.
    pub fn query_rcon(&self, command: &str) -> Result<String> {
        let socket = self.socket()?;
        socket.send(&self.command_datagram(command)?)?;

        let mut out = String::new();
        loop {
            let mut buf = [0u8; 1400];
            let n = match socket.recv(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            if n <= 4 {
                break;
            }
            out.push_str(&String::from_utf8_lossy(&buf[4..n]));
        }

        let lower = out.to_lowercase();
        if lower.contains("bad challenge.") {
            log::warn!("rcon: {} rejected challenge", self.remote);
            return Err(Error::BadRconChallenge);
        }
        if lower.contains("bad rcon_password.") {
            log::warn!("rcon: {} rejected password", self.remote);
            return Err(Error::BadRconPassword);
        }
        Ok(out)
    }

    /// Challenges (if not already challenged) then round-trips an `echo` of
    /// a one-off token, reporting whether the configured password was
    /// accepted by checking the token came back.
    pub fn is_rcon_password_valid(&mut self) -> Result<bool> {
        if self.challenge.is_none() {
            self.challenge_rcon()?;
        }

        let token = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos().to_string())
            .unwrap_or_else(|_| "0".to_string());

        match self.query_rcon(&format!("echo {}", token)) {
            Ok(reply) => Ok(reply.contains(&token)),
            Err(Error::BadRconPassword) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn get_cvar(&self, name: &str) -> Result<String> {
        let reply = self.query_rcon(name)?;
        // Typical reply shape: `"<name>" = "<value>"\n`.
        reply
            .split('"')
            .nth(3)
            .map(|s| s.to_string())
            .ok_or_else(|| Error::GameServer(reply))
    }

    pub fn is_logging(&self) -> Result<bool> {
        let reply = self.query_rcon("log")?;
        Ok(!reply.to_lowercase().contains("not currently logging"))
    }

    pub fn start_log(&self) -> Result<()> {
        self.query_rcon("log on").map(|_| ())
    }

    pub fn stop_log(&self) -> Result<()> {
        self.query_rcon("log off").map(|_| ())
    }

    /// Registered log destinations. `logaddress_add` with no arguments
    /// lists the current set on most engines; servers that reject the bare
    /// form just fail the caller's own regex match over an empty-looking
    /// reply, which this returns as an empty `Vec` rather than an error.
    pub fn get_log_addresses(&self) -> Result<Vec<SocketAddr>> {
        let reply = self.query_rcon("logaddress_add")?;
        Ok(log_address_re()
            .captures_iter(&reply)
            .filter_map(|caps| caps.name("addr")?.as_str().parse().ok())
            .collect())
    }

    pub fn add_log_address(&self, address: SocketAddr) -> Result<()> {
        let reply = self.query_rcon(&format!("logaddress_add {}", address))?;
        let lower = reply.to_lowercase();
        let success_marker = format!("logaddress_add:  {}", address).to_lowercase();
        if lower.contains(&success_marker) {
            return Ok(());
        }
        if lower.contains("already in list") {
            return Err(Error::AddressAlreadyInList);
        }
        if lower.contains("unable to resolve") {
            return Err(Error::UnableToResolve);
        }
        Err(Error::GameServer(reply))
    }

    pub fn delete_log_address(&self, address: SocketAddr) -> Result<()> {
        let reply = self.query_rcon(&format!("logaddress_del {}", address))?;
        let lower = reply.to_lowercase();
        let success_marker = format!("deleting:  {}", address).to_lowercase();
        if lower.contains(&success_marker) {
            return Ok(());
        }
        if lower.contains("not in list") || lower.contains("not found") {
            return Err(Error::AddressNotFound);
        }
        if lower.contains("unable to resolve") {
            return Err(Error::UnableToResolve);
        }
        if lower.contains("removed 0") || lower.contains("no addresses") {
            return Err(Error::NoAddressesAdded);
        }
        Err(Error::GameServer(reply))
    }

    pub fn get_status(&self) -> Result<String> {
        self.query_rcon("status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn command_datagram_requires_challenge_first() {
        let rcon = GoldSrcRcon::new(
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 27015),
            "hunter2",
            None,
        );
        assert!(matches!(
            rcon.command_datagram("status"),
            Err(Error::BadRconChallenge)
        ));
    }

    #[test]
    fn command_datagram_embeds_challenge_and_password() {
        let mut rcon = GoldSrcRcon::new(
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 27015),
            "hunter2",
            None,
        );
        rcon.challenge = Some("123456".to_string());
        let datagram = rcon.command_datagram("status").unwrap();
        let text = String::from_utf8_lossy(&datagram[4..]);
        assert_eq!(text, "rcon 123456 \"hunter2\" status\n");
    }

    #[test]
    fn challenge_reply_regex_extracts_digits() {
        let caps = challenge_reply_re()
            .captures("challenge rcon 987654321")
            .unwrap();
        assert_eq!(&caps["challenge"], "987654321");
    }

    #[test]
    fn challenge_reply_regex_rejects_unexpected_text() {
        assert!(challenge_reply_re().captures("unexpected").is_none());
    }

    #[test]
    fn not_currently_logging_phrase_is_the_negative_signal() {
        let off = "Server logging is not currently logging commands.\n";
        let on = "Server logging is currently logging to address 1.2.3.4:27500.\n";
        assert!(off.to_lowercase().contains("not currently logging"));
        assert!(!on.to_lowercase().contains("not currently logging"));
    }
}
