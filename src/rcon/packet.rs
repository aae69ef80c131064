//! Source RCON wire packet: framing, encoding, and blocking-socket decoding.
//!
//! Layout: `size:i32 ‖ id:i32 ‖ type:i32 ‖ body:NUL-terminated ‖ 0x00`,
//! little-endian throughout, where `size` counts every byte after itself.
//! Adapted from the async reference in this pack's retrieval set
//! (`to_bytes`/`from_bytes` shape), rewritten against a blocking
//! `std::io::Read`/`Write` pair instead of tokio's `AsyncRead`/`AsyncWrite`.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Source RCON packet type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PacketType {
    /// `SERVERDATA_RESPONSE_VALUE` / `SERVERDATA_AUTH_RESPONSE` (server->client).
    Response = 0,
    /// `SERVERDATA_EXECCOMMAND` (client->server).
    ExecCommand = 2,
    /// `SERVERDATA_AUTH` (client->server).
    Auth = 3,
}

impl From<i32> for PacketType {
    fn from(value: i32) -> Self {
        match value {
            0 => PacketType::Response,
            2 => PacketType::ExecCommand,
            3 => PacketType::Auth,
            // The protocol reuses 0 for both auth-response and command
            // reply; anything else observed on the wire is still data the
            // caller needs to see, so fold it into Response rather than
            // erroring here.
            _ => PacketType::Response,
        }
    }
}

/// One framed Source RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub packet_type: PacketType,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, packet_type: PacketType, body: impl Into<String>) -> Self {
        Packet {
            id,
            packet_type,
            body: body.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let body_bytes = self.body.as_bytes();
        // id(4) + type(4) + body + NUL + NUL
        let payload_len = 4 + 4 + body_bytes.len() + 2;

        let mut out = Vec::with_capacity(4 + payload_len);
        out.extend_from_slice(&(payload_len as i32).to_le_bytes());
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&(self.packet_type as i32).to_le_bytes());
        out.extend_from_slice(body_bytes);
        out.push(0);
        out.push(0);
        out
    }

    /// Write this packet to `stream` as a single framed write.
    pub fn write_to<W: Write>(&self, stream: &mut W) -> Result<()> {
        stream.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Read one complete packet off `stream`, blocking until `size` bytes
    /// of payload have been accumulated rather than trusting a single
    /// `read` call to return the whole packet — the partial-read fix noted
    /// in this crate's design notes.
    pub fn read_from<R: Read>(stream: &mut R) -> Result<Packet> {
        let mut size_buf = [0u8; 4];
        stream.read_exact(&mut size_buf)?;
        let size = i32::from_le_bytes(size_buf);
        if size < 10 {
            return Err(Error::Format(format!("rcon packet size {} too small", size)));
        }

        let mut payload = vec![0u8; size as usize];
        stream.read_exact(&mut payload)?;

        let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let packet_type = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let body_end = payload.len().saturating_sub(2);
        let body = String::from_utf8_lossy(&payload[8..body_end]).into_owned();

        Ok(Packet {
            id,
            packet_type: packet_type.into(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_through_bytes() {
        let packet = Packet::new(7, PacketType::ExecCommand, "status");
        let bytes = packet.to_bytes();
        let mut cursor = Cursor::new(bytes);
        let decoded = Packet::read_from(&mut cursor).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn empty_body_round_trips() {
        let packet = Packet::new(1, PacketType::ExecCommand, "");
        let mut cursor = Cursor::new(packet.to_bytes());
        let decoded = Packet::read_from(&mut cursor).unwrap();
        assert_eq!(decoded.body, "");
    }

    #[test]
    fn read_accumulates_across_partial_reads() {
        let packet = Packet::new(42, PacketType::Response, "a long enough body to split");
        let bytes = packet.to_bytes();

        struct Trickle<'a> {
            data: &'a [u8],
            pos: usize,
        }
        impl<'a> Read for Trickle<'a> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = 3.min(buf.len()).min(self.data.len() - self.pos);
                buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            }
        }

        let mut trickle = Trickle { data: &bytes, pos: 0 };
        let decoded = Packet::read_from(&mut trickle).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_undersized_packet() {
        let mut cursor = Cursor::new(5i32.to_le_bytes().to_vec());
        assert!(Packet::read_from(&mut cursor).is_err());
    }
}
