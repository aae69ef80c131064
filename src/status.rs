//! Parsing the text reply to the RCON `status` command.
//!
//! `status` is an admin console command, not a binary A2S response, and its
//! tabular layout differs between GoldSrc and Source. Both dialects are
//! matched with `regex`, compiled once via `OnceLock` the way the
//! connection-lifecycle helpers elsewhere in the pack compile their
//! free-text matchers (e.g. `uwuhazelnut-MCServerNap`'s player-count regex).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// One connected player as reported by `status`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub userid: u32,
    pub name: String,
    pub uniqueid: String,
    pub connected: String,
    pub ping: u32,
    pub loss: u32,
    pub address: Option<String>,
}

/// A HLTV/SourceTV relay entry, reported on its own line by some dialects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HltvInfo {
    pub name: String,
    pub address: String,
}

/// A connected participant: either a normal player or a relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum User {
    Normal(UserInfo),
    Hltv(HltvInfo),
}

/// Parsed `status` reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusInfo {
    pub hostname: Option<String>,
    pub map: Option<String>,
    /// Player count read from the header line common to both dialects.
    pub active_players: u32,
    pub max_players: Option<u32>,
    /// GoldSrc-only trailing `<N> users` total, kept distinct from
    /// `active_players` rather than coalesced (the two can legitimately
    /// differ: `users` includes connecting HLTV relays).
    pub users_count: Option<u32>,
    pub users: Vec<User>,
    /// Engine/build version string from the `version:` line, if present.
    pub version: Option<String>,
    /// The server's own reported `udp/ip:`/`tcp/ip:` address, if present.
    pub address: Option<String>,
    /// The unparsed reply this was built from.
    pub raw: String,
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^hostname:\s*(?P<hostname>.*)$").unwrap()
    })
}

fn map_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^map\s*:\s*(?P<map>\S+)").unwrap())
}

fn players_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^players\s*:\s*(?P<active>\d+)\s*(?:active)?\s*\((?P<max>\d+)\s*max\)").unwrap()
    })
}

fn goldsrc_users_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(?P<count>\d+)\s+users?$").unwrap())
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^version\s*:\s*(?P<version>.*)$").unwrap())
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^(?:udp|tcp)/ip\s*:\s*(?P<address>\S+)").unwrap())
}

fn source_user_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^#\s*(?P<userid>\d+)\s+"(?P<name>[^"]*)"\s+(?P<uniqueid>\S+)\s+(?P<connected>[\d:]+)\s+(?P<ping>\d+)\s+(?P<loss>\d+)\s+\S+\s+\d+\s+(?P<address>\S+)"#,
        )
        .unwrap()
    })
}

fn goldsrc_user_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^#\s*(?P<userid>\d+)\s+"(?P<name>[^"]*)"\s+(?P<uniqueid>\S+)\s+(?P<connected>[\d:]+)\s+(?P<ping>\d+)\s+(?P<loss>\d+)$"#,
        )
        .unwrap()
    })
}

fn hltv_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?mi)^#\s*\d+\s+"(?P<name>[^"]*)"\s+HLTV\s+.*?(?P<address>\d+\.\d+\.\d+\.\d+:\d+)"#)
            .unwrap()
    })
}

/// Parse a `status` reply. Neither dialect is auto-detected from content
/// alone since formats overlap partially; both sets of line patterns are
/// tried and whichever lines match are kept, which works in practice since
/// the two dialects never share a misleading false-positive shape.
pub fn parse_status(reply: &str) -> Result<StatusInfo> {
    let players = players_re()
        .captures(reply)
        .ok_or_else(|| Error::Format("status reply missing players: line".into()))?;
    let active_players: u32 = players["active"]
        .parse()
        .map_err(|_| Error::Format("non-numeric active player count".into()))?;
    let max_players: Option<u32> = players.name("max").and_then(|m| m.as_str().parse().ok());

    let hostname = header_re()
        .captures(reply)
        .map(|c| c["hostname"].trim().to_string());
    let map = map_re().captures(reply).map(|c| c["map"].to_string());
    let users_count = goldsrc_users_re()
        .captures(reply)
        .and_then(|c| c["count"].parse().ok());
    let version = version_re()
        .captures(reply)
        .map(|c| c["version"].trim().to_string());
    let address = address_re().captures(reply).map(|c| c["address"].to_string());

    let mut users = Vec::new();
    for caps in hltv_line_re().captures_iter(reply) {
        users.push(User::Hltv(HltvInfo {
            name: caps["name"].to_string(),
            address: caps["address"].to_string(),
        }));
    }
    for caps in source_user_line_re().captures_iter(reply) {
        users.push(User::Normal(user_from_captures(&caps, true)?));
    }
    if users.is_empty() {
        for caps in goldsrc_user_line_re().captures_iter(reply) {
            users.push(User::Normal(user_from_captures(&caps, false)?));
        }
    }

    Ok(StatusInfo {
        hostname,
        map,
        active_players,
        max_players,
        users_count,
        users,
        version,
        address,
        raw: reply.to_string(),
    })
}

fn user_from_captures(caps: &regex::Captures, has_address: bool) -> Result<UserInfo> {
    Ok(UserInfo {
        userid: caps["userid"]
            .parse()
            .map_err(|_| Error::Format("non-numeric userid in status line".into()))?,
        name: caps["name"].to_string(),
        uniqueid: caps["uniqueid"].to_string(),
        connected: caps["connected"].to_string(),
        ping: caps["ping"].parse().unwrap_or(0),
        loss: caps["loss"].parse().unwrap_or(0),
        address: if has_address {
            caps.name("address").map(|m| m.as_str().to_string())
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_status_reply() {
        let reply = "hostname: My Source Server\n\
                      version : 1.0\n\
                      map     : de_dust2\n\
                      players : 2 active (32 max)\n\
                      # userid name uniqueid connected ping loss state rate adr\n\
                      #      2 \"Alice\" STEAM_1:0:1 05:12 40 0 active 100000 1.2.3.4:27005\n\
                      #      3 \"Bob\" STEAM_1:0:2 00:45 60 1 active 100000 5.6.7.8:27005\n";

        let status = parse_status(reply).unwrap();
        assert_eq!(status.hostname.as_deref(), Some("My Source Server"));
        assert_eq!(status.map.as_deref(), Some("de_dust2"));
        assert_eq!(status.active_players, 2);
        assert_eq!(status.max_players, Some(32));
        assert_eq!(status.users.len(), 2);
        assert!(matches!(&status.users[0], User::Normal(u) if u.name == "Alice"));
        assert_eq!(status.version.as_deref(), Some("1.0"));
        assert_eq!(status.raw, reply);
    }

    #[test]
    fn parses_goldsrc_users_tail() {
        let reply = "hostname: GS Server\n\
                      version : 48/1.1.2.2/Stdio\n\
                      udp/ip  : 10.0.0.5:27015\n\
                      map     : crossfire\n\
                      players : 1 (16 max)\n\
                      #      1 \"Carl\" STEAM_0:1:1 01:00 20 0\n\
                      1 users\n";

        let status = parse_status(reply).unwrap();
        assert_eq!(status.active_players, 1);
        assert_eq!(status.users_count, Some(1));
        assert_eq!(status.users.len(), 1);
        assert_eq!(status.version.as_deref(), Some("48/1.1.2.2/Stdio"));
        assert_eq!(status.address.as_deref(), Some("10.0.0.5:27015"));
    }

    #[test]
    fn missing_players_line_is_format_error() {
        assert!(parse_status("hostname: nope\n").is_err());
    }
}
