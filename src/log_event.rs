//! Parsing free-form Half-Life engine log lines into typed events.
//!
//! The wire format is plain text, one event per line:
//! `L MM/DD/YYYY - HH:MM:SS: <payload>`. Everything after the timestamp is
//! itself unstructured — games invented their own verbs over the format's
//! lifetime — so classification works by trying a fixed, priority-ordered
//! list of patterns against the payload and taking the first match, the way
//! the original engine's own log watchers do it. A line matching the outer
//! timestamp frame but none of the inner patterns is not a hard error: it is
//! surfaced through the listener's exception channel as
//! [`Error::UnknownEvent`] so one unrecognized game mod doesn't take down
//! the whole stream.
//!
//! Regexes are compiled once via `std::sync::OnceLock`, matching the
//! approach in `status.rs`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// A player's log-line identity: `"<name><<userid>><<steamid>><<team>>"`.
/// Not every event carries a full quadruple; fields absent on the wire are
/// left at their default rather than represented with a separate "empty"
/// singleton.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Player {
    pub name: String,
    pub userid: i64,
    pub steamid: String,
    pub team: String,
}

impl Player {
    /// A placeholder identity for events that don't name a player (e.g.
    /// server-wide actions), with `userid` set to the sentinel `-1`.
    pub fn unknown() -> Self {
        Player {
            userid: -1,
            ..Default::default()
        }
    }
}

/// Case-insensitive key/value bag parsed from a line's trailing
/// `(key "value")` / `(key)` suffixes. Lookups lowercase the query key;
/// iteration and `get_raw` preserve the casing seen on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fields shared by every parsed event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventHeader {
    /// The full line exactly as received, for diagnostics/passthrough.
    pub raw_line: String,
    /// Numeric event code, three digits with an optional sub-letter (e.g.
    /// `"057"`, `"063a"`), matching the codes HLstats-style log watchers key
    /// their own classification tables on.
    pub code: String,
    /// Short descriptive name for the matched event (e.g. `"Player Killed"`).
    pub name: String,
    pub properties: Properties,
}

/// A classified log event. `EventHeader` is embedded by name in every
/// variant rather than shared through inheritance, since plain Rust enums
/// have no base-struct mechanism.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    WorldTrigger {
        header: EventHeader,
        event: String,
    },
    ServerCvar {
        header: EventHeader,
        name: String,
        value: String,
    },
    ServerMessage {
        header: EventHeader,
        message: String,
    },
    RconCommand {
        header: EventHeader,
        address: String,
        command: String,
    },
    RconBadPassword {
        header: EventHeader,
        address: String,
    },
    PlayerConnected {
        header: EventHeader,
        player: Player,
        address: String,
    },
    PlayerDisconnected {
        header: EventHeader,
        player: Player,
        reason: String,
    },
    PlayerEnteredGame {
        header: EventHeader,
        player: Player,
    },
    PlayerChangedName {
        header: EventHeader,
        player: Player,
        new_name: String,
    },
    PlayerJoinedTeam {
        header: EventHeader,
        player: Player,
        team: String,
    },
    PlayerChangedRole {
        header: EventHeader,
        player: Player,
        role: String,
    },
    PlayerSay {
        header: EventHeader,
        player: Player,
        message: String,
        team_only: bool,
    },
    PlayerPrivateMessage {
        header: EventHeader,
        from: Player,
        to: Player,
        message: String,
    },
    PlayerSteamValidated {
        header: EventHeader,
        player: Player,
    },
    PlayerKilled {
        header: EventHeader,
        killer: Player,
        victim: Player,
        weapon: String,
    },
    PlayerSuicide {
        header: EventHeader,
        player: Player,
        weapon: String,
    },
    PlayerTeamKilled {
        header: EventHeader,
        killer: Player,
        victim: Player,
        weapon: String,
    },
    PlayerInjured {
        header: EventHeader,
        attacker: Player,
        victim: Player,
        weapon: String,
        damage: i64,
    },
    PlayerUsedItem {
        header: EventHeader,
        player: Player,
        item: String,
    },
    PlayerPickedUpItem {
        header: EventHeader,
        player: Player,
        item: String,
    },
    PlayerTriggered {
        header: EventHeader,
        player: Player,
        event: String,
    },
    PlayerBanned {
        header: EventHeader,
        player: Player,
        duration: String,
        by: String,
    },
    PlayerKicked {
        header: EventHeader,
        player: Player,
        by: String,
    },
    TeamTriggered {
        header: EventHeader,
        team: String,
        event: String,
    },
    TeamScored {
        header: EventHeader,
        team: String,
        score: i64,
    },
    RoundStart {
        header: EventHeader,
    },
    RoundEnd {
        header: EventHeader,
        reason: String,
    },
    LogFileStarted {
        header: EventHeader,
        file: String,
        game: String,
        version: String,
    },
    LogFileClosed {
        header: EventHeader,
    },
}

impl Event {
    pub fn header(&self) -> &EventHeader {
        match self {
            Event::WorldTrigger { header, .. }
            | Event::ServerCvar { header, .. }
            | Event::ServerMessage { header, .. }
            | Event::RconCommand { header, .. }
            | Event::RconBadPassword { header, .. }
            | Event::PlayerConnected { header, .. }
            | Event::PlayerDisconnected { header, .. }
            | Event::PlayerEnteredGame { header, .. }
            | Event::PlayerChangedName { header, .. }
            | Event::PlayerJoinedTeam { header, .. }
            | Event::PlayerChangedRole { header, .. }
            | Event::PlayerSay { header, .. }
            | Event::PlayerPrivateMessage { header, .. }
            | Event::PlayerSteamValidated { header, .. }
            | Event::PlayerKilled { header, .. }
            | Event::PlayerSuicide { header, .. }
            | Event::PlayerTeamKilled { header, .. }
            | Event::PlayerInjured { header, .. }
            | Event::PlayerUsedItem { header, .. }
            | Event::PlayerPickedUpItem { header, .. }
            | Event::PlayerTriggered { header, .. }
            | Event::PlayerBanned { header, .. }
            | Event::PlayerKicked { header, .. }
            | Event::TeamTriggered { header, .. }
            | Event::TeamScored { header, .. }
            | Event::RoundStart { header }
            | Event::RoundEnd { header, .. }
            | Event::LogFileStarted { header, .. }
            | Event::LogFileClosed { header } => header,
        }
    }
}

fn line_frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^L (?P<month>0[1-9]|1[0-2])/(?P<day>0[1-9]|[12]\d|3[01])/(?P<year>\d{4}) - (?P<hour>[01]\d|2[0-3]):(?P<min>[0-5]\d):(?P<sec>[0-5]\d): (?P<payload>.*)$"#,
        )
        .unwrap()
    })
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1-based) for `year`, accounting for leap Februaries.
/// The frame regex already constrains `day` to `01..=31`, so this only needs
/// to catch the months where that range is still too wide (Feb, and the
/// 30-day months admitting a `31`).
fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn player_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?P<name>[^"<]*)<(?P<userid>-?\d+)><(?P<steamid>[^>]*)><(?P<team>[^>]*)>"#)
            .unwrap()
    })
}

fn property_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\((\S+)(?: "([^"]*)")?\)"#).unwrap())
}

/// Extract every `(key "value")` / `(key)` suffix from a line, in the order
/// they appear.
fn parse_properties(payload: &str) -> Properties {
    let entries = property_re()
        .captures_iter(payload)
        .map(|c| {
            let key = c[1].to_string();
            let value = c.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            (key, value)
        })
        .collect();
    Properties { entries }
}

fn player_at(payload: &str, caps: &regex::Captures, group: &str) -> Option<Player> {
    let m = caps.name(group)?;
    let sub = player_re().captures(&payload[m.start()..m.end()])?;
    Some(Player {
        name: sub["name"].to_string(),
        userid: sub["userid"].parse().unwrap_or(-1),
        steamid: sub["steamid"].to_string(),
        team: sub["team"].to_string(),
    })
}

struct Pattern {
    code: &'static str,
    name: &'static str,
    regex: fn() -> &'static Regex,
    build: fn(&EventHeader, &regex::Captures, &str) -> Event,
}

macro_rules! pattern_re {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).unwrap())
        }
    };
}

pattern_re!(
    re_connected,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" connected, address "(?P<address>[^"]*)""#
);
pattern_re!(
    re_entered,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" entered the game"#
);
pattern_re!(
    re_disconnected,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" disconnected \(reason "(?P<reason>[^"]*)"\)"#
);
pattern_re!(
    re_changed_name,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" changed name to "(?P<new_name>[^"]*)""#
);
pattern_re!(
    re_joined_team,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" joined team "(?P<team>[^"]*)""#
);
pattern_re!(
    re_changed_role,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" changed role to "(?P<role>[^"]*)""#
);
pattern_re!(
    re_say_team,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" say_team "(?P<message>.*)""#
);
pattern_re!(
    re_say,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" say "(?P<message>.*)""#
);
pattern_re!(
    re_tell,
    r#"^"(?P<from>[^"]+<[^>]*><[^>]*><[^>]*>)" tell "(?P<to>[^"]+<[^>]*><[^>]*><[^>]*>)" "(?P<message>.*)""#
);
pattern_re!(
    re_steam_validated,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" STEAM USERID validated"#
);
pattern_re!(
    re_killed,
    r#"^"(?P<killer>[^"]+<[^>]*><[^>]*><[^>]*>)" killed "(?P<victim>[^"]+<[^>]*><[^>]*><[^>]*>)" with "(?P<weapon>[^"]*)""#
);
pattern_re!(
    re_teamkilled,
    r#"^"(?P<killer>[^"]+<[^>]*><[^>]*><[^>]*>)" triggered "Kill_Team" against "(?P<victim>[^"]+<[^>]*><[^>]*><[^>]*>)" with "(?P<weapon>[^"]*)""#
);
pattern_re!(
    re_suicide,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" committed suicide with "(?P<weapon>[^"]*)""#
);
pattern_re!(
    re_injured,
    r#"^"(?P<attacker>[^"]+<[^>]*><[^>]*><[^>]*>)" attacked "(?P<victim>[^"]+<[^>]*><[^>]*><[^>]*>)" with "(?P<weapon>[^"]*)" \(damage "(?P<damage>-?\d+)"\)"#
);
pattern_re!(
    re_used_item,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" triggered "Use_(?P<item>\S+)""#
);
pattern_re!(
    re_picked_up,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" acquired "(?P<item>\S+)""#
);
pattern_re!(
    re_banned,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" was banned "(?P<duration>[^"]*)" by "(?P<by>[^"]*)""#
);
pattern_re!(
    re_kicked,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" kicked by "(?P<by>[^"]*)""#
);
pattern_re!(
    re_player_triggered,
    r#"^"(?P<player>[^"]+<[^>]*><[^>]*><[^>]*>)" triggered "(?P<event>[^"]+)""#
);
pattern_re!(
    re_team_scored,
    r#"^Team "(?P<team>[^"]+)" scored "(?P<score>-?\d+)""#
);
pattern_re!(re_team_triggered, r#"^Team "(?P<team>[^"]+)" triggered "(?P<event>[^"]+)""#);
pattern_re!(re_world_trigger, r#"^World triggered "(?P<event>[^"]+)""#);
pattern_re!(re_round_start, r#"^World triggered "Round_Start""#);
pattern_re!(re_round_end, r#"^World triggered "Round_End"(?: \(reason "(?P<reason>[^"]*)"\))?"#);
pattern_re!(re_server_cvar, r#"^Server cvar "(?P<name>\S+)" = "(?P<value>[^"]*)""#);
pattern_re!(re_rcon_bad, r#"^rcon from "(?P<address>[^"]+)": bad password"#);
pattern_re!(re_rcon_command, r#"^rcon from "(?P<address>[^"]+)": command "(?P<command>.*)""#);
pattern_re!(re_log_started, r#"^Log file started \(file "(?P<file>[^"]*)"\) \(game "(?P<game>[^"]*)"\) \(version "(?P<version>[^"]*)"\)"#);
pattern_re!(re_log_closed, r#"^Log file closed"#);
pattern_re!(re_server_message, r#"^Server say "(?P<message>.*)""#);

fn require_player(payload: &str, caps: &regex::Captures, group: &str) -> Player {
    player_at(payload, caps, group).unwrap_or_else(Player::unknown)
}

/// Priority-ordered classification table. Earlier entries win on ambiguity
/// (e.g. team-kill must be tried before the generic "triggered" fallback,
/// and `say_team` before `say` since one is a prefix of the other).
fn patterns() -> &'static [Pattern] {
    static TABLE: OnceLock<Vec<Pattern>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            Pattern { code: "002a", name: "Log file started", regex: re_log_started, build: |h, c, _| Event::LogFileStarted {
                header: h.clone(), file: c["file"].to_string(), game: c["game"].to_string(), version: c["version"].to_string(),
            }},
            Pattern { code: "002b", name: "Log file closed", regex: re_log_closed, build: |h, _, _| Event::LogFileClosed { header: h.clone() }},
            Pattern { code: "004b", name: "Bad Rcon Password", regex: re_rcon_bad, build: |h, c, _| Event::RconBadPassword {
                header: h.clone(), address: c["address"].to_string(),
            }},
            Pattern { code: "004a", name: "Rcon Command", regex: re_rcon_command, build: |h, c, _| Event::RconCommand {
                header: h.clone(), address: c["address"].to_string(), command: c["command"].to_string(),
            }},
            Pattern { code: "001b", name: "Server Cvar", regex: re_server_cvar, build: |h, c, _| Event::ServerCvar {
                header: h.clone(), name: c["name"].to_string(), value: c["value"].to_string(),
            }},
            Pattern { code: "006", name: "Server Message", regex: re_server_message, build: |h, c, _| Event::ServerMessage {
                header: h.clone(), message: c["message"].to_string(),
            }},
            Pattern { code: "051a", name: "Player Connected", regex: re_connected, build: |h, c, p| Event::PlayerConnected {
                header: h.clone(), player: require_player(p, c, "player"), address: c["address"].to_string(),
            }},
            Pattern { code: "050b", name: "Player Steam ID Validated", regex: re_steam_validated, build: |h, c, p| Event::PlayerSteamValidated {
                header: h.clone(), player: require_player(p, c, "player"),
            }},
            Pattern { code: "052", name: "Player Disconnected", regex: re_disconnected, build: |h, c, p| Event::PlayerDisconnected {
                header: h.clone(), player: require_player(p, c, "player"), reason: c["reason"].to_string(),
            }},
            Pattern { code: "051", name: "Player Entered Game", regex: re_entered, build: |h, c, p| Event::PlayerEnteredGame {
                header: h.clone(), player: require_player(p, c, "player"),
            }},
            Pattern { code: "056", name: "Player Changed Name", regex: re_changed_name, build: |h, c, p| Event::PlayerChangedName {
                header: h.clone(), player: require_player(p, c, "player"), new_name: c["new_name"].to_string(),
            }},
            Pattern { code: "060", name: "Player Joined Team", regex: re_joined_team, build: |h, c, p| Event::PlayerJoinedTeam {
                header: h.clone(), player: require_player(p, c, "player"), team: c["team"].to_string(),
            }},
            Pattern { code: "063a", name: "Player Changed Role", regex: re_changed_role, build: |h, c, p| Event::PlayerChangedRole {
                header: h.clone(), player: require_player(p, c, "player"), role: c["role"].to_string(),
            }},
            Pattern { code: "066", name: "Player Private Message", regex: re_tell, build: |h, c, p| Event::PlayerPrivateMessage {
                header: h.clone(), from: require_player(p, c, "from"), to: require_player(p, c, "to"), message: c["message"].to_string(),
            }},
            Pattern { code: "069", name: "Player Said (Team)", regex: re_say_team, build: |h, c, p| Event::PlayerSay {
                header: h.clone(), player: require_player(p, c, "player"), message: c["message"].to_string(), team_only: true,
            }},
            Pattern { code: "068", name: "Player Said", regex: re_say, build: |h, c, p| Event::PlayerSay {
                header: h.clone(), player: require_player(p, c, "player"), message: c["message"].to_string(), team_only: false,
            }},
            Pattern { code: "059", name: "Player Team Killed", regex: re_teamkilled, build: |h, c, p| Event::PlayerTeamKilled {
                header: h.clone(), killer: require_player(p, c, "killer"), victim: require_player(p, c, "victim"), weapon: c["weapon"].to_string(),
            }},
            Pattern { code: "057", name: "Player Killed", regex: re_killed, build: |h, c, p| Event::PlayerKilled {
                header: h.clone(), killer: require_player(p, c, "killer"), victim: require_player(p, c, "victim"), weapon: c["weapon"].to_string(),
            }},
            Pattern { code: "050", name: "Player Suicide", regex: re_suicide, build: |h, c, p| Event::PlayerSuicide {
                header: h.clone(), player: require_player(p, c, "player"), weapon: c["weapon"].to_string(),
            }},
            Pattern { code: "058", name: "Player Injured", regex: re_injured, build: |h, c, p| Event::PlayerInjured {
                header: h.clone(), attacker: require_player(p, c, "attacker"), victim: require_player(p, c, "victim"),
                weapon: c["weapon"].to_string(), damage: c["damage"].parse().unwrap_or(0),
            }},
            Pattern { code: "053", name: "Player Used Item", regex: re_used_item, build: |h, c, p| Event::PlayerUsedItem {
                header: h.clone(), player: require_player(p, c, "player"), item: c["item"].to_string(),
            }},
            Pattern { code: "054", name: "Player Picked Up Item", regex: re_picked_up, build: |h, c, p| Event::PlayerPickedUpItem {
                header: h.clone(), player: require_player(p, c, "player"), item: c["item"].to_string(),
            }},
            Pattern { code: "055", name: "Player Banned", regex: re_banned, build: |h, c, p| Event::PlayerBanned {
                header: h.clone(), player: require_player(p, c, "player"), duration: c["duration"].to_string(), by: c["by"].to_string(),
            }},
            Pattern { code: "052b", name: "Player Kicked", regex: re_kicked, build: |h, c, p| Event::PlayerKicked {
                header: h.clone(), player: require_player(p, c, "player"), by: c["by"].to_string(),
            }},
            // Priority 6: generic player-triggered catch-all. Tried after
            // every more specific "triggered"-shaped pattern above so, e.g.,
            // a team-kill isn't misclassified as a bare trigger.
            Pattern { code: "063b", name: "Player Triggered", regex: re_player_triggered, build: |h, c, p| Event::PlayerTriggered {
                header: h.clone(), player: require_player(p, c, "player"), event: c["event"].to_string(),
            }},
            Pattern { code: "065", name: "Team Scored", regex: re_team_scored, build: |h, c, _| Event::TeamScored {
                header: h.clone(), team: c["team"].to_string(), score: c["score"].parse().unwrap_or(0),
            }},
            Pattern { code: "061", name: "Team Triggered", regex: re_team_triggered, build: |h, c, _| Event::TeamTriggered {
                header: h.clone(), team: c["team"].to_string(), event: c["event"].to_string(),
            }},
            Pattern { code: "062", name: "World Triggered (Round Start)", regex: re_round_start, build: |h, _, _| Event::RoundStart { header: h.clone() }},
            Pattern { code: "062", name: "World Triggered (Round End)", regex: re_round_end, build: |h, c, _| Event::RoundEnd {
                header: h.clone(), reason: c.name("reason").map(|m| m.as_str().to_string()).unwrap_or_default(),
            }},
            Pattern { code: "062", name: "World Triggered", regex: re_world_trigger, build: |h, c, _| Event::WorldTrigger {
                header: h.clone(), event: c["event"].to_string(),
            }},
        ]
    })
}

/// Parse one raw log line into a typed [`Event`]. Comment lines (beginning
/// with `//` once the timestamp frame is stripped, a convention some mods
/// use for heartbeat padding) are silently dropped by returning `Ok(None)`.
/// A line that doesn't match the outer frame at all, or matches it but none
/// of the classifier's patterns, yields [`Error::UnknownEvent`].
pub fn parse_line(line: &str) -> Result<Option<Event>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = line_frame_re()
        .captures(line)
        .ok_or_else(|| Error::UnknownEvent(line.to_string()))?;

    let year: u32 = caps["year"].parse().unwrap_or(0);
    let month: u32 = caps["month"].parse().unwrap_or(0);
    let day: u32 = caps["day"].parse().unwrap_or(0);
    if day > days_in_month(year, month) {
        return Err(Error::UnknownEvent(line.to_string()));
    }

    let payload = &caps["payload"];

    if payload.starts_with("//") {
        return Ok(None);
    }

    for pattern in patterns() {
        if let Some(inner) = (pattern.regex)().captures(payload) {
            let header = EventHeader {
                raw_line: line.to_string(),
                code: pattern.code.to_string(),
                name: pattern.name.to_string(),
                properties: parse_properties(payload),
            };
            return Ok(Some((pattern.build)(&header, &inner, payload)));
        }
    }

    Err(Error::UnknownEvent(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connected_line() {
        let line = r#"L 04/22/2024 - 18:03:11: "Alice<12><STEAM_1:0:1><>" connected, address "1.2.3.4:27005""#;
        let event = parse_line(line).unwrap().unwrap();
        match event {
            Event::PlayerConnected { player, address, header } => {
                assert_eq!(player.name, "Alice");
                assert_eq!(player.userid, 12);
                assert_eq!(address, "1.2.3.4:27005");
                assert_eq!(header.code, "051a");
                assert_eq!(header.name, "Player Connected");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn parses_kill_with_numeric_code() {
        let line = r#"L 04/22/2024 - 18:04:00: "Alice<12><STEAM_1:0:1><CT>" killed "Bob<13><STEAM_1:0:2><T>" with "ak47""#;
        let event = parse_line(line).unwrap().unwrap();
        assert_eq!(event.header().code, "057");
    }

    #[test]
    fn parses_team_scored_with_numeric_code() {
        let line = r#"L 04/22/2024 - 18:09:00: Team "CT" scored "3""#;
        let event = parse_line(line).unwrap().unwrap();
        assert_eq!(event.header().code, "065");
    }

    #[test]
    fn parses_tell_line() {
        let line = r#"L 04/22/2024 - 18:10:00: "Alice<12><STEAM_1:0:1><CT>" tell "Bob<13><STEAM_1:0:2><T>" "watch your flank""#;
        let event = parse_line(line).unwrap().unwrap();
        match event {
            Event::PlayerPrivateMessage { header, from, to, message } => {
                assert_eq!(header.code, "066");
                assert_eq!(from.name, "Alice");
                assert_eq!(to.name, "Bob");
                assert_eq!(message, "watch your flank");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn parses_steam_validated_line() {
        let line = r#"L 04/22/2024 - 18:11:00: "Alice<12><STEAM_1:0:1><>" STEAM USERID validated"#;
        let event = parse_line(line).unwrap().unwrap();
        match event {
            Event::PlayerSteamValidated { header, player } => {
                assert_eq!(header.code, "050b");
                assert_eq!(player.name, "Alice");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn rejects_day_that_does_not_exist_in_february() {
        let line = r#"L 02/30/2010 - 18:00:00: "Alice<12><STEAM_1:0:1><>" entered the game"#;
        let err = parse_line(line).unwrap_err();
        assert!(matches!(err, Error::UnknownEvent(_)));
    }

    #[test]
    fn rejects_month_out_of_range() {
        let line = r#"L 13/01/2010 - 18:00:00: "Alice<12><STEAM_1:0:1><>" entered the game"#;
        let err = parse_line(line).unwrap_err();
        assert!(matches!(err, Error::UnknownEvent(_)));
    }

    #[test]
    fn accepts_leap_day() {
        let line = r#"L 02/29/2024 - 18:00:00: "Alice<12><STEAM_1:0:1><>" entered the game"#;
        assert!(parse_line(line).unwrap().is_some());
    }

    #[test]
    fn parses_kill_before_generic_trigger() {
        let line = r#"L 04/22/2024 - 18:04:00: "Alice<12><STEAM_1:0:1><CT>" killed "Bob<13><STEAM_1:0:2><T>" with "ak47""#;
        let event = parse_line(line).unwrap().unwrap();
        assert!(matches!(event, Event::PlayerKilled { .. }));
    }

    #[test]
    fn say_team_takes_priority_over_say() {
        let line = r#"L 04/22/2024 - 18:05:00: "Alice<12><STEAM_1:0:1><CT>" say_team "rotating b""#;
        let event = parse_line(line).unwrap().unwrap();
        match event {
            Event::PlayerSay { team_only, message, .. } => {
                assert!(team_only);
                assert_eq!(message, "rotating b");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn property_suffixes_are_parsed_case_insensitively() {
        let line = r#"L 04/22/2024 - 18:06:00: World triggered "Round_End" (reason "Terrorists_Win")"#;
        let event = parse_line(line).unwrap().unwrap();
        let header = event.header();
        assert_eq!(header.properties.get("REASON"), Some("Terrorists_Win"));
    }

    #[test]
    fn comment_lines_are_dropped() {
        let line = "L 04/22/2024 - 18:07:00: // heartbeat";
        assert!(parse_line(line).unwrap().is_none());
    }

    #[test]
    fn unrecognized_payload_is_unknown_event() {
        let line = "L 04/22/2024 - 18:08:00: some future mod's brand new verb";
        let err = parse_line(line).unwrap_err();
        assert!(matches!(err, Error::UnknownEvent(_)));
    }

    #[test]
    fn non_matching_outer_frame_is_unknown_event() {
        assert!(parse_line("not a log line at all").is_err());
    }

    #[test]
    fn unknown_player_sentinel_has_uid_negative_one() {
        assert_eq!(Player::unknown().userid, -1);
    }
}
