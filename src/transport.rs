//! A2S query transport: request encoding, single/split response dispatch,
//! and challenge handling shared by the info/player/rules queries.
//!
//! Adapted from the teacher crate's own `examples/info.rs` demo, which opens
//! a short-lived connected `UdpSocket` per query rather than pooling one.
//! That's kept here: `Transport::query` binds, connects, sends, and receives
//! within a single call, so the timeout semantics map directly onto
//! `set_read_timeout` without extra bookkeeping.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::packet::{self, MessageHeader, SplitDialect};
use crate::wire;

/// Which engine family a remote server speaks. Selects the split-packet
/// header dialect and which request byte strings are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engine {
    GoldSrc,
    Source,
}

impl Engine {
    fn split_dialect(self) -> SplitDialect {
        match self {
            Engine::GoldSrc => SplitDialect::GoldSrc,
            Engine::Source => SplitDialect::Source,
        }
    }
}

const A2S_INFO_PAYLOAD: &[u8] = b"Source Engine Query\0";
const A2S_PLAYER_TYPE: u8 = b'U';
const A2S_RULES_TYPE: u8 = b'V';

/// Owns the remote address and engine selection for one server's A2S
/// queries. Cheap to construct; holds no socket between calls.
#[derive(Clone, Debug)]
pub struct Transport {
    remote: SocketAddr,
    engine: Engine,
}

impl Transport {
    pub fn new(remote: SocketAddr, engine: Engine) -> Self {
        Transport { remote, engine }
    }

    /// Send `request` and return the reassembled response payload with the
    /// leading single/split marker and message-header byte already
    /// stripped off by `packet::parse_single_packet`. `timeout` of `None`
    /// blocks forever; spec.md's 0/-1-means-infinite convention is resolved
    /// one layer up, in `Server`.
    pub fn query(&self, request: &[u8], timeout: Option<Duration>) -> Result<(MessageHeader, Vec<u8>)> {
        let socket = self.bind(timeout)?;
        socket.send(request)?;

        let mut datagrams: Vec<Vec<u8>> = Vec::new();
        loop {
            let mut buf = [0u8; 1400];
            let n = socket.recv(&mut buf)?;
            let datagram = buf[..n].to_vec();

            if !packet::is_split(&datagram)? {
                let single = packet::parse_single_packet(&datagram)?;
                return Ok((single.message_header, single.payload.to_vec()));
            }

            datagrams.push(datagram);
            if self.split_complete(&datagrams)? {
                break;
            }
        }

        let payload = packet::reassemble(self.engine.split_dialect(), &datagrams)?;
        let header_byte = *payload
            .first()
            .ok_or_else(|| Error::Format("reassembled split payload is empty".into()))?;
        Ok((header_byte.into(), payload[1..].to_vec()))
    }

    fn split_complete(&self, datagrams: &[Vec<u8>]) -> Result<bool> {
        let first = packet::parse_fragment(&datagrams[0], self.engine.split_dialect())?;
        Ok(datagrams.len() >= first.total_packets as usize)
    }

    fn bind(&self, timeout: Option<Duration>) -> Result<UdpSocket> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(self.remote)?;
        socket.set_read_timeout(timeout)?;
        Ok(socket)
    }

    /// A2S_INFO request.
    pub fn info(&self, timeout: Option<Duration>) -> Result<(MessageHeader, Vec<u8>)> {
        let request = wire::concat(&[&packet::SINGLE_PACKET_HEADER, b"T", A2S_INFO_PAYLOAD]);
        self.query(&request, timeout)
    }

    /// A2S_PLAYER / A2S_RULES share a challenge-response handshake: send the
    /// request with a zero challenge, and if the server replies with a
    /// challenge packet (`'A'`) instead of data, resend with the returned
    /// challenge value.
    fn challenged_query(&self, request_type: u8, timeout: Option<Duration>) -> Result<(MessageHeader, Vec<u8>)> {
        let request = wire::concat(&[
            &packet::SINGLE_PACKET_HEADER,
            &[request_type],
            &(-1i32).to_le_bytes(),
        ]);
        let (header, payload) = self.query(&request, timeout)?;

        if header != MessageHeader::ChallengeResponse {
            return Ok((header, payload));
        }

        if payload.len() < 4 {
            return Err(Error::Format("challenge response shorter than 4 bytes".into()));
        }
        let challenge = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        if challenge == -1 {
            return Err(Error::BadQueryChallenge);
        }

        let request = wire::concat(&[
            &packet::SINGLE_PACKET_HEADER,
            &[request_type],
            &challenge.to_le_bytes(),
        ]);
        self.query(&request, timeout)
    }

    /// A2S_PLAYER request, including the challenge round-trip.
    pub fn player(&self, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let (_, payload) = self.challenged_query(A2S_PLAYER_TYPE, timeout)?;
        Ok(payload)
    }

    /// A2S_RULES request, including the challenge round-trip.
    pub fn rules(&self, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let (_, payload) = self.challenged_query(A2S_RULES_TYPE, timeout)?;
        Ok(payload)
    }

    /// A2S_PING request (deprecated on modern engines but still answered by
    /// most GoldSrc servers). Resolves to `false` on timeout rather than
    /// propagating the I/O error, since "no reply within the deadline" is
    /// exactly what a ping is checking for.
    pub fn ping(&self, timeout: Option<Duration>) -> Result<bool> {
        let request = wire::concat(&[&packet::SINGLE_PACKET_HEADER, &[0x69]]);
        match self.query(&request, timeout) {
            Ok((header, _)) => Ok(header == MessageHeader::PingResponse),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_picks_matching_split_dialect() {
        assert_eq!(Engine::GoldSrc.split_dialect(), SplitDialect::GoldSrc);
        assert_eq!(Engine::Source.split_dialect(), SplitDialect::Source);
    }
}
