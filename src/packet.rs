//! A2S packet framing: single-vs-split header dispatch and the two
//! split-packet reassembly dialects (GoldSrc, 9-byte header; OrangeBox /
//! Source, 12-byte header).
//!
//! Adapted from the teacher crate's `packet.rs`: the `MessageHeader` enum and
//! the single-packet parser are kept close to the original. Fragment parsing
//! is rewritten against the dialect the caller selects up front (the engine
//! kind), rather than attempting to auto-detect it — auto-detection isn't
//! possible from the wire alone, as spec.md notes.

use nom::{
    combinator::rest,
    number::complete::{le_i32, le_u8},
    IResult,
};

use crate::error::{Error, Result};

/// Single-packet marker: `0xFFFFFFFF`.
pub const SINGLE_PACKET_HEADER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
/// Split-packet marker: `0xFEFFFFFF`.
pub const SPLIT_PACKET_HEADER: [u8; 4] = [0xFE, 0xFF, 0xFF, 0xFF];

/// Indicates the type of payload carried by a single packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageHeader {
    /// `'A'` (0x41) — challenge response
    ChallengeResponse,
    /// `'I'` (0x49) — Source-style info response
    InfoResponseSource,
    /// `'m'` (0x6D) — GoldSrc-style info response
    InfoResponseGoldSource,
    /// `'D'` (0x44) — player response
    PlayerResponse,
    /// `'E'` (0x45) — rules response
    RulesResponse,
    /// `'j'` (0x6A) — ping response
    PingResponse,
    /// Any other byte.
    Other(u8),
}

impl From<u8> for MessageHeader {
    fn from(input: u8) -> Self {
        match input {
            0x41 => MessageHeader::ChallengeResponse,
            0x49 => MessageHeader::InfoResponseSource,
            0x6D => MessageHeader::InfoResponseGoldSource,
            0x44 => MessageHeader::PlayerResponse,
            0x45 => MessageHeader::RulesResponse,
            0x6A => MessageHeader::PingResponse,
            other => MessageHeader::Other(other),
        }
    }
}

/// A fully-received single packet: the 4-byte marker has been consumed and
/// the remaining bytes are `message_header ++ payload`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinglePacket<'a> {
    pub message_header: MessageHeader,
    pub payload: &'a [u8],
}

/// Which split-packet header layout to apply. Selected by engine kind, not
/// auto-detected — the wire format gives no reliable way to tell them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitDialect {
    /// 9-byte header: `id:i32 ‖ nibble-packed (total:4, index:4)`.
    GoldSrc,
    /// 12-byte header: `id:i32 ‖ total:u8 ‖ index:u8 ‖ size:i16`.
    Source,
}

/// One fragment of a split response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Shared id grouping all fragments of one response.
    pub id: i32,
    /// Total number of fragments in the response.
    pub total_packets: u8,
    /// This fragment's zero-based index.
    pub packet_number: u8,
    /// Payload bytes, header stripped.
    pub payload: &'a [u8],
}

/// Inspect the leading 4 bytes of a datagram and report whether it is a
/// split-packet response. Raises [`Error::UnknownHeader`] for anything else.
pub fn is_split(datagram: &[u8]) -> Result<bool> {
    match header(datagram) {
        Ok((_, header)) if header == SINGLE_PACKET_HEADER => Ok(false),
        Ok((_, header)) if header == SPLIT_PACKET_HEADER => Ok(true),
        Ok((_, header)) => Err(Error::UnknownHeader(header)),
        Err(_) => Err(Error::Format("datagram shorter than 4-byte header".into())),
    }
}

fn header(input: &[u8]) -> IResult<&[u8], [u8; 4]> {
    let (input, bytes) = nom::bytes::complete::take(4usize)(input)?;
    let mut header = [0u8; 4];
    header.copy_from_slice(bytes);
    Ok((input, header))
}

/// Parse a single-packet response. `datagram` includes the 4-byte marker.
pub fn parse_single_packet(datagram: &[u8]) -> Result<SinglePacket> {
    let (input, _) = header(datagram).map_err(|_| Error::Format("missing header".into()))?;
    let (input, type_byte) =
        le_u8(input).map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
            Error::Format("single packet missing type byte".into())
        })?;
    let (_, payload) = rest::<_, nom::error::Error<&[u8]>>(input).expect("rest never fails");
    Ok(SinglePacket {
        message_header: type_byte.into(),
        payload,
    })
}

/// Parse one fragment of a split response according to `dialect`. `datagram`
/// includes the 4-byte split marker.
pub fn parse_fragment(datagram: &[u8], dialect: SplitDialect) -> Result<Fragment> {
    let (input, _) = header(datagram).map_err(|_| Error::Format("missing header".into()))?;
    let (input, id) = le_i32::<_, nom::error::Error<&[u8]>>(input)
        .map_err(|_| Error::Format("fragment missing id".into()))?;

    match dialect {
        SplitDialect::GoldSrc => {
            let (input, packed) = le_u8::<_, nom::error::Error<&[u8]>>(input)
                .map_err(|_| Error::Format("fragment missing count/index byte".into()))?;
            let total_packets = packed & 0x0F;
            let packet_number = packed >> 4;
            let (_, payload) = rest::<_, nom::error::Error<&[u8]>>(input).expect("rest never fails");
            Ok(Fragment {
                id,
                total_packets,
                packet_number,
                payload,
            })
        }
        SplitDialect::Source => {
            let (input, total_packets) = le_u8::<_, nom::error::Error<&[u8]>>(input)
                .map_err(|_| Error::Format("fragment missing total count".into()))?;
            let (input, packet_number) = le_u8::<_, nom::error::Error<&[u8]>>(input)
                .map_err(|_| Error::Format("fragment missing index".into()))?;
            // 2-byte max-packet-size field; present on all but a handful of
            // ancient AppIds the spec doesn't ask us to special-case.
            let (input, _size) = nom::number::complete::le_i16::<_, nom::error::Error<&[u8]>>(input)
                .map_err(|_| Error::Format("fragment missing size field".into()))?;
            let (_, payload) = rest::<_, nom::error::Error<&[u8]>>(input).expect("rest never fails");
            Ok(Fragment {
                id,
                total_packets,
                packet_number,
                payload,
            })
        }
    }
}

/// Reassemble a complete set of split-response datagrams (each including its
/// 4-byte marker) into the concatenated payload, headers stripped. Packets
/// may arrive out of order; they are placed into a fixed-size array by
/// index before concatenation. A fragment whose reported `total_packets` is
/// zero yields an empty result.
pub fn reassemble(dialect: SplitDialect, datagrams: &[Vec<u8>]) -> Result<Vec<u8>> {
    if datagrams.is_empty() {
        return Ok(Vec::new());
    }

    let first = parse_fragment(&datagrams[0], dialect)?;
    let total = first.total_packets as usize;
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut slots: Vec<Option<Vec<u8>>> = vec![None; total];
    for datagram in datagrams {
        let fragment = parse_fragment(datagram, dialect)?;
        let index = fragment.packet_number as usize;
        if index >= total {
            return Err(Error::Format(format!(
                "fragment index {} out of range for {} total packets",
                index, total
            )));
        }
        slots[index] = Some(fragment.payload.to_vec());
    }

    let mut out = Vec::new();
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(payload) => out.extend_from_slice(&payload),
            None => {
                return Err(Error::Format(format!("missing fragment at index {}", index)))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_split_detects_single_and_split_markers() {
        assert_eq!(is_split(&[0xFF, 0xFF, 0xFF, 0xFF, 0x49]).unwrap(), false);
        assert_eq!(is_split(&[0xFE, 0xFF, 0xFF, 0xFF, 0x00]).unwrap(), true);
    }

    #[test]
    fn is_split_rejects_unknown_header() {
        let err = is_split(&[0x01, 0x02, 0x03, 0x04]).unwrap_err();
        assert!(matches!(err, Error::UnknownHeader([0x01, 0x02, 0x03, 0x04])));
    }

    #[test]
    fn single_packet_dispatches_on_type_byte() {
        let datagram = [0xFF, 0xFF, 0xFF, 0xFF, 0x49, 0x01, 0x02];
        let packet = parse_single_packet(&datagram).unwrap();
        assert_eq!(packet.message_header, MessageHeader::InfoResponseSource);
        assert_eq!(packet.payload, &[0x01, 0x02]);
    }

    #[test]
    fn goldsrc_fragment_unpacks_nibbles() {
        // id = 1, packed byte: low nibble 3 (total), high nibble 1 (index)
        let datagram = [0xFE, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00, 0x13, 0xAA];
        let fragment = parse_fragment(&datagram, SplitDialect::GoldSrc).unwrap();
        assert_eq!(fragment.id, 1);
        assert_eq!(fragment.total_packets, 3);
        assert_eq!(fragment.packet_number, 1);
        assert_eq!(fragment.payload, &[0xAA]);
    }

    #[test]
    fn source_fragment_reads_total_index_size() {
        let datagram = [
            0xFE, 0xFF, 0xFF, 0xFF, // marker
            0x01, 0x00, 0x00, 0x00, // id
            0x02, // total
            0x00, // index
            0x10, 0x04, // size (LE 1040)
            0xAA, 0xBB,
        ];
        let fragment = parse_fragment(&datagram, SplitDialect::Source).unwrap();
        assert_eq!(fragment.total_packets, 2);
        assert_eq!(fragment.packet_number, 0);
        assert_eq!(fragment.payload, &[0xAA, 0xBB]);
    }

    #[test]
    fn reassemble_orders_out_of_order_fragments() {
        let make = |index: u8, payload: &[u8]| -> Vec<u8> {
            let mut d = vec![0xFE, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x00, 0x00, 0x02, index, 0x00, 0x00];
            d.extend_from_slice(payload);
            d
        };
        let datagrams = vec![make(1, b"world"), make(0, b"hello")];
        let out = reassemble(SplitDialect::Source, &datagrams).unwrap();
        assert_eq!(out, b"helloworld");
    }

    #[test]
    fn reassemble_zero_count_is_empty() {
        let datagram = vec![0xFE, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let out = reassemble(SplitDialect::Source, &[datagram]).unwrap();
        assert!(out.is_empty());
    }
}
