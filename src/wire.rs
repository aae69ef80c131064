//! Wire primitives shared across the crate.
//!
//! The A2S parsers (`packet`, `info`, `player`, `rules`) work on borrowed
//! slices through `nom` combinators, since that's the teacher's own style for
//! parsing a whole datagram at once; the byte-classification helpers below
//! (`server_type`, `environment`, `c_string`, ...) live here for that reason.
//! The RCON code instead builds and consumes owned buffers incrementally off
//! a `TcpStream`/`UdpSocket`, so it gets the plain offset-based accessors
//! further down rather than going through `nom` for single-field reads.

use nom::{
    bytes::complete::take_till, character::complete::char, number::complete::le_u8,
    sequence::terminated, IResult,
};

/// The dedicated/listen/relay byte tag on an A2S_INFO response. Both engines
/// encode it the same way; the value is otherwise opaque to this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerType {
    Dedicated,
    NonDedicated,
    SourceTv,
    /// Any value outside the three documented tags.
    Other(u8),
}

impl From<u8> for ServerType {
    fn from(input: u8) -> Self {
        match input {
            0x44 | 0x64 => ServerType::Dedicated,
            0x4C | 0x6C => ServerType::NonDedicated,
            0x50 | 0x70 => ServerType::SourceTv,
            other => ServerType::Other(other),
        }
    }
}

/// The host OS byte tag on an A2S_INFO response. Both upper- and lower-case
/// wire values are seen in practice and treated as equivalent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Linux,
    Windows,
    MacOs,
    Other(u8),
}

impl From<u8> for Environment {
    fn from(input: u8) -> Self {
        match input {
            0x4C | 0x6C => Environment::Linux,
            0x57 | 0x77 => Environment::Windows,
            0x4D | 0x6D | 0x4F | 0x6F => Environment::MacOs,
            other => Environment::Other(other),
        }
    }
}

/// Read one byte and classify it as a [`ServerType`]. Used by both engines'
/// A2S_INFO parsers in [`crate::info`].
pub(crate) fn server_type(input: &[u8]) -> IResult<&[u8], ServerType> {
    le_u8(input).map(|(next, res)| (next, res.into()))
}

/// Read one byte and classify it as an [`Environment`]. Used by both
/// engines' A2S_INFO parsers in [`crate::info`].
pub(crate) fn environment(input: &[u8]) -> IResult<&[u8], Environment> {
    le_u8(input).map(|(next, res)| (next, res.into()))
}

/// Read a NUL-terminated string out of a `nom` input slice. All protocol
/// text is treated as single-byte-per-character, matching the binary path's
/// specified fallback encoding.
pub(crate) fn c_string(input: &[u8]) -> IResult<&[u8], String> {
    terminated(take_till(|c| c == 0x00u8), char(0x00 as char))(input)
        .map(|(next, res)| (next, String::from_utf8_lossy(res).into_owned()))
}

/// Consume one NUL byte, failing if the next byte isn't one.
pub(crate) fn parse_null(input: &[u8]) -> IResult<&[u8], char> {
    char(0x00 as char)(input)
}

/// Read one byte as a boolean: zero is `false`, anything else `true`.
pub(crate) fn parse_bool(input: &[u8]) -> IResult<&[u8], bool> {
    le_u8(input).map(|(next, res)| (next, res != 0))
}

/// Concatenate a sequence of byte slices into one owned buffer.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total: usize = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Read a NUL-terminated string starting at `*offset`, advancing `*offset`
/// past the terminator. Bytes are reinterpreted one-per-character (no
/// multibyte decoding), matching the single-byte fallback encoding the
/// binary path is specified to use.
pub fn read_cstr(buf: &[u8], offset: &mut usize) -> String {
    let start = *offset;
    let mut end = start;
    while end < buf.len() && buf[end] != 0 {
        end += 1;
    }
    let s: String = buf[start..end].iter().map(|&b| b as char).collect();
    *offset = if end < buf.len() { end + 1 } else { end };
    s
}

/// Read a little-endian `i16` at `offset`, advancing it by 2.
pub fn read_i16(buf: &[u8], offset: &mut usize) -> Option<i16> {
    let bytes = buf.get(*offset..*offset + 2)?;
    *offset += 2;
    Some(i16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Read a little-endian `i32` at `offset`, advancing it by 4.
pub fn read_i32(buf: &[u8], offset: &mut usize) -> Option<i32> {
    let bytes = buf.get(*offset..*offset + 4)?;
    *offset += 4;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a little-endian `f32` at `offset`, advancing it by 4.
pub fn read_f32(buf: &[u8], offset: &mut usize) -> Option<f32> {
    let bytes = buf.get(*offset..*offset + 4)?;
    *offset += 4;
    Some(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a little-endian `u8` at `offset`, advancing it by 1.
pub fn read_u8(buf: &[u8], offset: &mut usize) -> Option<u8> {
    let b = *buf.get(*offset)?;
    *offset += 1;
    Some(b)
}
