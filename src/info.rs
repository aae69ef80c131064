//! A2S_INFO response parsing for both engine families.
//!
//! GoldSrc and Source use unrelated wire layouts for the same logical
//! request, dispatched by the message-header type byte the caller already
//! read off the packet (`packet::MessageHeader::InfoResponseGoldSource` /
//! `InfoResponseSource`). Each dialect gets its own struct; `ServerInfo` is
//! the tagged union callers match on.
//!
//! Adapted from the teacher crate's `info.rs`. The Ship's extra fields
//! (`the_ship`, `TheShipGameMode`) are dropped — nothing in this crate's
//! scope queries that game — and the Source side's `ExtraDataFields` struct
//! is flattened directly onto `SourceInfo` rather than nested.

use nom::{
    combinator::{all_consuming, opt},
    number::complete::{le_i16, le_i32, le_u64, le_u8},
    Finish, IResult,
};

use crate::error::{Error, Result};
use crate::wire::{c_string, environment, parse_bool, parse_null, server_type};
pub use crate::wire::{Environment, ServerType};

/// Parsed Half-Life mod type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModType {
    /// Single and multiplayer mod.
    SingleAndMultiplayer,
    /// Multiplayer-only mod.
    MultiplayerOnly,
    /// Any other value.
    Other(u8),
}

impl From<u8> for ModType {
    fn from(input: u8) -> Self {
        match input {
            0 => ModType::SingleAndMultiplayer,
            1 => ModType::MultiplayerOnly,
            other => ModType::Other(other),
        }
    }
}

/// Custom or standard Half-Life DLL for the mod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModDll {
    /// Mod uses the base Half-Life DLL.
    HalfLife,
    /// Mod uses a custom DLL.
    Custom,
    /// Any other value.
    Other(u8),
}

impl From<u8> for ModDll {
    fn from(input: u8) -> Self {
        match input {
            0 => ModDll::HalfLife,
            1 => ModDll::Custom,
            other => ModDll::Other(other),
        }
    }
}

/// Mod-specific fields, present only when `mod_half_life` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HalfLifeMod {
    pub link: String,
    pub download_link: String,
    pub version: i32,
    pub size: i32,
    pub mod_type: ModType,
    pub dll: ModDll,
}

/// A2S_INFO response from a GoldSrc engine server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoldSrcInfo {
    pub address: String,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub players: u8,
    pub max_players: u8,
    pub protocol: u8,
    pub server_type: ServerType,
    pub environment: Environment,
    pub visibility: bool,
    pub mod_half_life: bool,
    pub mod_fields: Option<HalfLifeMod>,
    pub vac: bool,
    pub bots: u8,
}

/// A2S_INFO response from a Source engine server, with the optional
/// extra-data-flag fields flattened onto the struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceInfo {
    pub protocol: u8,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub app_id: i16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
    pub server_type: ServerType,
    pub environment: Environment,
    pub visibility: bool,
    pub vac: bool,
    pub version: String,
    pub extra_data_flag: u8,
    /// Present when `extra_data_flag & 0x80`.
    pub port: Option<i16>,
    /// Present when `extra_data_flag & 0x10`.
    pub steam_id: Option<u64>,
    /// Present when `extra_data_flag & 0x40`.
    pub source_tv_port: Option<i16>,
    /// Present when `extra_data_flag & 0x40`.
    pub source_tv_name: Option<String>,
    /// Present when `extra_data_flag & 0x20`.
    pub keywords: Option<String>,
    /// Present when `extra_data_flag & 0x01`.
    pub game_id: Option<u64>,
}

/// Tagged union over both engines' A2S_INFO responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerInfo {
    Source(SourceInfo),
    GoldSrc(GoldSrcInfo),
}

/// Parse a GoldSrc A2S_INFO payload (message header byte already stripped).
pub fn parse_goldsrc_info(input: &[u8]) -> Result<GoldSrcInfo> {
    all_consuming(goldsrc_info)(input)
        .finish()
        .map(|(_, info)| info)
        .map_err(|e| Error::Format(format!("goldsrc info: {:?}", e.code)))
}

/// Parse a Source A2S_INFO payload (message header byte already stripped).
pub fn parse_source_info(input: &[u8]) -> Result<SourceInfo> {
    all_consuming(source_info)(input)
        .finish()
        .map(|(_, info)| info)
        .map_err(|e| Error::Format(format!("source info: {:?}", e.code)))
}

fn goldsrc_info(input: &[u8]) -> IResult<&[u8], GoldSrcInfo> {
    let (input, address) = c_string(input)?;
    let (input, name) = c_string(input)?;
    let (input, map) = c_string(input)?;
    let (input, folder) = c_string(input)?;
    let (input, game) = c_string(input)?;
    let (input, players) = le_u8(input)?;
    let (input, max_players) = le_u8(input)?;
    let (input, protocol) = le_u8(input)?;
    let (input, server_type) = server_type(input)?;
    let (input, environment) = environment(input)?;
    let (input, visibility) = parse_bool(input)?;
    let (input, mod_half_life) = parse_bool(input)?;
    let (input, mod_fields) = mod_fields(input, mod_half_life)?;
    let (input, vac) = parse_bool(input)?;
    let (input, bots) = le_u8(input)?;

    Ok((
        input,
        GoldSrcInfo {
            address,
            name,
            map,
            folder,
            game,
            players,
            max_players,
            protocol,
            server_type,
            environment,
            visibility,
            mod_half_life,
            mod_fields,
            vac,
            bots,
        },
    ))
}

fn mod_fields(input: &[u8], is_mod: bool) -> IResult<&[u8], Option<HalfLifeMod>> {
    if !is_mod {
        return Ok((input, None));
    }
    let (input, link) = c_string(input)?;
    let (input, download_link) = c_string(input)?;
    let (input, _) = parse_null(input)?;
    let (input, version) = le_i32(input)?;
    let (input, size) = le_i32(input)?;
    let (input, mod_type) = le_u8(input).map(|(next, res)| (next, res.into()))?;
    let (input, dll) = le_u8(input).map(|(next, res)| (next, res.into()))?;

    Ok((
        input,
        Some(HalfLifeMod {
            link,
            download_link,
            version,
            size,
            mod_type,
            dll,
        }),
    ))
}

fn source_info(input: &[u8]) -> IResult<&[u8], SourceInfo> {
    let (input, protocol) = le_u8(input)?;
    let (input, name) = c_string(input)?;
    let (input, map) = c_string(input)?;
    let (input, folder) = c_string(input)?;
    let (input, game) = c_string(input)?;
    let (input, app_id) = le_i16(input)?;
    let (input, players) = le_u8(input)?;
    let (input, max_players) = le_u8(input)?;
    let (input, bots) = le_u8(input)?;
    let (input, server_type) = server_type(input)?;
    let (input, environment) = environment(input)?;
    let (input, visibility) = parse_bool(input)?;
    let (input, vac) = parse_bool(input)?;
    let (input, version) = c_string(input)?;

    // Not every server sends the extra data flag byte at all.
    let (input, extra_data_flag) = opt(le_u8)(input)?;
    let extra_data_flag = extra_data_flag.unwrap_or(0);

    let (input, port) = if extra_data_flag & 0x80 != 0 {
        let (input, v) = le_i16(input)?;
        (input, Some(v))
    } else {
        (input, None)
    };
    let (input, steam_id) = if extra_data_flag & 0x10 != 0 {
        let (input, v) = le_u64(input)?;
        (input, Some(v))
    } else {
        (input, None)
    };
    let (input, source_tv_port) = if extra_data_flag & 0x40 != 0 {
        let (input, v) = le_i16(input)?;
        (input, Some(v))
    } else {
        (input, None)
    };
    let (input, source_tv_name) = if extra_data_flag & 0x40 != 0 {
        let (input, v) = c_string(input)?;
        (input, Some(v))
    } else {
        (input, None)
    };
    let (input, keywords) = if extra_data_flag & 0x20 != 0 {
        let (input, v) = c_string(input)?;
        (input, Some(v))
    } else {
        (input, None)
    };
    let (input, game_id) = if extra_data_flag & 0x01 != 0 {
        let (input, v) = le_u64(input)?;
        (input, Some(v))
    } else {
        (input, None)
    };

    Ok((
        input,
        SourceInfo {
            protocol,
            name,
            map,
            folder,
            game,
            app_id,
            players,
            max_players,
            bots,
            server_type,
            environment,
            visibility,
            vac,
            version,
            extra_data_flag,
            port,
            steam_id,
            source_tv_port,
            source_tv_name,
            keywords,
            game_id,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_goldsrc_cstrike() {
        let cs: [u8; 150] = [
            0x37, 0x37, 0x2E, 0x31, 0x31, 0x31, 0x2E, 0x31, 0x39, 0x34, 0x2E, 0x31, 0x31, 0x30, 0x3A,
            0x32, 0x37, 0x30, 0x31, 0x35, 0x00, 0x46, 0x52, 0x20, 0x2D, 0x20, 0x56, 0x65, 0x72, 0x79,
            0x47, 0x61, 0x6D, 0x65, 0x73, 0x2E, 0x6E, 0x65, 0x74, 0x20, 0x2D, 0x20, 0x44, 0x65, 0x61,
            0x74, 0x6D, 0x61, 0x74, 0x63, 0x68, 0x20, 0x2D, 0x20, 0x6F, 0x6E, 0x6C, 0x79, 0x20, 0x73,
            0x75, 0x72, 0x66, 0x5F, 0x73, 0x6B, 0x69, 0x20, 0x2D, 0x20, 0x6E, 0x67, 0x52, 0x00, 0x73,
            0x75, 0x72, 0x66, 0x5F, 0x73, 0x6B, 0x69, 0x00, 0x63, 0x73, 0x74, 0x72, 0x69, 0x6B, 0x65,
            0x00, 0x43, 0x6F, 0x75, 0x6E, 0x74, 0x65, 0x72, 0x2D, 0x53, 0x74, 0x72, 0x69, 0x6B, 0x65,
            0x00, 0x0C, 0x12, 0x2F, 0x64, 0x6C, 0x00, 0x01, 0x77, 0x77, 0x77, 0x2E, 0x63, 0x6F, 0x75,
            0x6E, 0x74, 0x65, 0x72, 0x2D, 0x73, 0x74, 0x72, 0x69, 0x6B, 0x65, 0x2E, 0x6E, 0x65, 0x74,
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x9E, 0xF7, 0x0A, 0x00, 0x01, 0x01, 0x00,
        ];

        let response = parse_goldsrc_info(&cs).unwrap();

        assert_eq!(
            GoldSrcInfo {
                address: "77.111.194.110:27015".to_string(),
                name: "FR - VeryGames.net - Deatmatch - only surf_ski - ngR".to_string(),
                map: "surf_ski".to_string(),
                folder: "cstrike".to_string(),
                game: "Counter-Strike".to_string(),
                players: 12,
                max_players: 18,
                protocol: 47,
                server_type: ServerType::Dedicated,
                environment: Environment::Linux,
                visibility: false,
                mod_half_life: true,
                mod_fields: Some(HalfLifeMod {
                    link: "www.counter-strike.net".to_string(),
                    download_link: "".to_string(),
                    version: 1,
                    size: 184000000,
                    mod_type: ModType::SingleAndMultiplayer,
                    dll: ModDll::Custom,
                }),
                vac: true,
                bots: 0,
            },
            response
        );
    }

    #[test]
    fn info_source_css() {
        let css: [u8; 95] = [
            0x02, 0x67, 0x61, 0x6D, 0x65, 0x32, 0x78, 0x73, 0x2E, 0x63, 0x6F, 0x6D, 0x20, 0x43, 0x6F,
            0x75, 0x6E, 0x74, 0x65, 0x72, 0x2D, 0x53, 0x74, 0x72, 0x69, 0x6B, 0x65, 0x20, 0x53, 0x6F,
            0x75, 0x72, 0x63, 0x65, 0x20, 0x23, 0x31, 0x00, 0x64, 0x65, 0x5F, 0x64, 0x75, 0x73, 0x74,
            0x00, 0x63, 0x73, 0x74, 0x72, 0x69, 0x6B, 0x65, 0x00, 0x43, 0x6F, 0x75, 0x6E, 0x74, 0x65,
            0x72, 0x2D, 0x53, 0x74, 0x72, 0x69, 0x6B, 0x65, 0x3A, 0x20, 0x53, 0x6F, 0x75, 0x72, 0x63,
            0x65, 0x00, 0xF0, 0x00, 0x05, 0x10, 0x04, 0x64, 0x6C, 0x00, 0x00, 0x31, 0x2E, 0x30, 0x2E,
            0x30, 0x2E, 0x32, 0x32, 0x00,
        ];

        let response = parse_source_info(&css).unwrap();

        assert_eq!(
            SourceInfo {
                protocol: 2,
                name: "game2xs.com Counter-Strike Source #1".to_string(),
                map: "de_dust".to_string(),
                folder: "cstrike".to_string(),
                game: "Counter-Strike: Source".to_string(),
                app_id: 240,
                players: 5,
                max_players: 16,
                bots: 4,
                server_type: ServerType::Dedicated,
                environment: Environment::Linux,
                visibility: false,
                vac: false,
                version: "1.0.0.22".to_string(),
                extra_data_flag: 0,
                port: None,
                steam_id: None,
                source_tv_port: None,
                source_tv_name: None,
                keywords: None,
                game_id: None,
            },
            response
        );
    }

    #[test]
    fn info_source_extra_data_flag_gates_optional_fields() {
        // protocol, 4 empty c-strings, app_id=0, players/max/bots=0, type/env/vis/vac,
        // empty version, flag=0x80 (port only), port=27015
        let mut css: Vec<u8> = vec![0x02];
        css.extend([0u8; 4]); // name, map, folder, game c-strings, all empty
        css.extend([0, 0]); // app_id
        css.extend([0, 0, 0]); // players, max_players, bots
        css.extend([b'd', b'l', 0, 0]); // server_type, environment, visibility, vac
        css.push(0); // version c-string (empty)
        css.push(0x80); // extra_data_flag: port only
        css.extend(27015i16.to_le_bytes());

        let response = parse_source_info(&css).unwrap();
        assert_eq!(response.extra_data_flag, 0x80);
        assert_eq!(response.port, Some(27015));
        assert_eq!(response.steam_id, None);
    }
}
