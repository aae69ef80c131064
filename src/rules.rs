//! A2S_RULES response parsing.
//!
//! Older engine versions may reply with a single truncated packet that cuts
//! off mid rule/value pair instead of splitting into multiple packets; the
//! leftover bytes are kept in `remaining_data` rather than treated as an
//! error. Adapted from the teacher crate's `rules.rs`.

use nom::{
    combinator::rest, error::ErrorKind, multi::many_m_n, number::complete::le_i16, Finish, IResult,
};

use crate::error::{Error, Result};
use crate::wire::c_string;

/// Contents of an A2S_RULES response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulesResponse {
    /// Number of rules the server reported.
    pub num_rules: i16,
    /// Parsed rule/value pairs, possibly fewer than `num_rules` if truncated.
    pub rules: Vec<RuleData>,
    /// Bytes left over once `rules` stopped parsing cleanly. Non-empty only
    /// when the response was truncated mid pair.
    pub remaining_data: String,
}

/// One rule/value pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleData {
    pub name: String,
    pub value: String,
}

/// Parse a full A2S_RULES payload (message header byte already stripped). A
/// full decode that still leaves unparsed bytes behind (rather than stopping
/// mid pair) is rejected as malformed.
pub fn parse_rules(input: &[u8]) -> Result<RulesResponse> {
    rules(input)
        .finish()
        .map(|(_, response)| response)
        .map_err(|e: nom::error::Error<&[u8]>| Error::Format(format!("rules response: {:?}", e.code)))
}

fn rules(input: &[u8]) -> IResult<&[u8], RulesResponse> {
    let (input, num_rules) = le_i16(input)?;
    let (input, rule_data) = many_m_n(0, num_rules.max(0) as usize, rule_data)(input)?;
    let (input, remaining_data) = rest(input)?;
    let remaining_data = String::from_utf8_lossy(remaining_data).into_owned();

    // All rules parsed cleanly but bytes remain: the payload doesn't match
    // its own declared count, which is a format violation rather than the
    // expected truncation case.
    if rule_data.len() as i16 == num_rules && !remaining_data.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::NonEmpty,
        )));
    }

    Ok((
        input,
        RulesResponse {
            num_rules,
            rules: rule_data,
            remaining_data,
        },
    ))
}

fn rule_data(input: &[u8]) -> IResult<&[u8], RuleData> {
    let (input, name) = c_string(input)?;
    let (input, value) = c_string(input)?;

    Ok((input, RuleData { name, value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, value: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(value.as_bytes());
        out.push(0);
    }

    #[test]
    fn parses_full_rule_set() {
        let mut payload = 2i16.to_le_bytes().to_vec();
        rule("coop", "0", &mut payload);
        rule("decalfrequency", "60", &mut payload);

        let response = parse_rules(&payload).unwrap();

        assert_eq!(2, response.num_rules);
        assert_eq!(
            vec![
                RuleData {
                    name: "coop".to_string(),
                    value: "0".to_string()
                },
                RuleData {
                    name: "decalfrequency".to_string(),
                    value: "60".to_string()
                },
            ],
            response.rules
        );
        assert!(response.remaining_data.is_empty());
    }

    #[test]
    fn truncated_single_packet_keeps_leftover_bytes() {
        let mut payload = 3i16.to_le_bytes().to_vec();
        rule("coop", "0", &mut payload);
        // Third rule cut off mid name, no terminator.
        payload.extend_from_slice(b"sv_pass");

        let response = parse_rules(&payload).unwrap();

        assert_eq!(3, response.num_rules);
        assert_eq!(1, response.rules.len());
        assert_eq!("sv_pass", response.remaining_data);
    }

    #[test]
    fn complete_payload_with_trailing_garbage_is_rejected() {
        let mut payload = 1i16.to_le_bytes().to_vec();
        rule("coop", "0", &mut payload);
        payload.extend_from_slice(&[0xFF, 0xFF, 0xFF]);

        assert!(parse_rules(&payload).is_err());
    }

    #[test]
    fn zero_rules_is_empty() {
        let payload = 0i16.to_le_bytes().to_vec();
        let response = parse_rules(&payload).unwrap();
        assert_eq!(0, response.num_rules);
        assert!(response.rules.is_empty());
        assert!(response.remaining_data.is_empty());
    }
}
