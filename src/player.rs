//! A2S_PLAYER response parsing.
//!
//! Adapted from the teacher crate's `player.rs`, with The Ship's per-player
//! deaths/money tail dropped — out of scope here.

use nom::{
    combinator::all_consuming,
    multi::many_m_n,
    number::complete::{le_f32, le_i32, le_u8},
    Finish, IResult,
};

use crate::error::{Error, Result};
use crate::wire::c_string;

/// A2S_PLAYER response: the reported player count plus one entry per player
/// actually included in the payload (connecting players count towards
/// `players` but carry no data of their own).
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerResponse {
    pub players: u8,
    pub player_data: Vec<PlayerInfo>,
}

/// One player's entry in an A2S_PLAYER response.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerInfo {
    pub index: u8,
    pub name: String,
    pub score: i32,
    pub duration: f32,
}

/// Parse a full A2S_PLAYER payload (message header byte already stripped).
pub fn parse_player(input: &[u8]) -> Result<PlayerResponse> {
    all_consuming(player)(input)
        .finish()
        .map(|(_, info)| info)
        .map_err(|e| Error::Format(format!("player response: {:?}", e.code)))
}

fn player(input: &[u8]) -> IResult<&[u8], PlayerResponse> {
    let (input, players) = le_u8(input)?;
    let (input, player_data) = many_m_n(0, players as usize, player_info)(input)?;

    Ok((
        input,
        PlayerResponse {
            players,
            player_data,
        },
    ))
}

fn player_info(input: &[u8]) -> IResult<&[u8], PlayerInfo> {
    let (input, index) = le_u8(input)?;
    let (input, name) = c_string(input)?;
    let (input, score) = le_i32(input)?;
    let (input, duration) = le_f32(input)?;

    Ok((
        input,
        PlayerInfo {
            index,
            name,
            score,
            duration,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_players() {
        let player: [u8; 49] = [
            0x02, 0x01, 0x5B, 0x44, 0x5D, 0x2D, 0x2D, 0x2D, 0x2D, 0x3E, 0x54, 0x2E, 0x4E, 0x2E, 0x57,
            0x3C, 0x2D, 0x2D, 0x2D, 0x2D, 0x00, 0x0E, 0x00, 0x00, 0x00, 0xB4, 0x97, 0x00, 0x44, 0x02,
            0x4B, 0x69, 0x6C, 0x6C, 0x65, 0x72, 0x20, 0x21, 0x21, 0x21, 0x00, 0x05, 0x00, 0x00, 0x00,
            0x69, 0x24, 0xD9, 0x43,
        ];

        let response = parse_player(&player).unwrap();

        let expected_players = vec![
            PlayerInfo {
                index: 1,
                name: "[D]---->T.N.W<----".to_string(),
                score: 14,
                duration: 514.37036f32,
            },
            PlayerInfo {
                index: 2,
                name: "Killer !!!".to_string(),
                score: 5,
                duration: 434.28445f32,
            },
        ];

        assert_eq!(2, response.players);
        assert_eq!(expected_players, response.player_data);
    }

    #[test]
    fn connecting_player_not_included_in_data() {
        let player: [u8; 29] = [
            0x02, 0x01, 0x5B, 0x44, 0x5D, 0x2D, 0x2D, 0x2D, 0x2D, 0x3E, 0x54, 0x2E, 0x4E, 0x2E, 0x57,
            0x3C, 0x2D, 0x2D, 0x2D, 0x2D, 0x00, 0x0E, 0x00, 0x00, 0x00, 0xB4, 0x97, 0x00, 0x44,
        ];

        let response = parse_player(&player).unwrap();

        let expected_player = vec![PlayerInfo {
            index: 1,
            name: "[D]---->T.N.W<----".to_string(),
            score: 14,
            duration: 514.37036f32,
        }];

        assert_eq!(2, response.players);
        assert_eq!(expected_player, response.player_data);
    }

    #[test]
    fn zero_players_is_empty() {
        let response = parse_player(&[0x00]).unwrap();
        assert_eq!(0, response.players);
        assert!(response.player_data.is_empty());
    }
}
