//! Optional (TLV) parameters and SAR/concatenation extraction.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// TLV tags used by this server.
pub mod tags {
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const NETWORK_ERROR_CODE: u16 = 0x0423;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const MORE_MESSAGES_TO_SEND: u16 = 0x0426;
    pub const MESSAGE_STATE: u16 = 0x0427;
}

/// One tag/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Vec<u8>,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

/// Ordered collection of optional parameters.
///
/// Insertion order is preserved so encoding is deterministic; lookups are
/// linear, which is fine for the handful of TLVs a PDU carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvMap(Vec<Tlv>);

impl TlvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, tlv: Tlv) {
        self.0.push(tlv);
    }

    pub fn get(&self, tag: u16) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|tlv| tlv.tag == tag)
            .map(|tlv| tlv.value.as_slice())
    }

    pub fn get_u8(&self, tag: u16) -> Option<u8> {
        self.get(tag).and_then(|v| v.first().copied())
    }

    /// Reads a 2-byte big-endian value; a 1-byte value is widened, which
    /// covers clients that encode the SAR reference as a single octet.
    pub fn get_u16(&self, tag: u16) -> Option<u16> {
        self.get(tag).and_then(|v| match v.len() {
            0 => None,
            1 => Some(v[0] as u16),
            _ => Some(u16::from_be_bytes([v[0], v[1]])),
        })
    }

    /// Value as a string, trimming one trailing NUL if present.
    pub fn get_string(&self, tag: u16) -> Option<String> {
        self.get(tag).map(|v| {
            let end = v.iter().position(|&b| b == 0).unwrap_or(v.len());
            String::from_utf8_lossy(&v[..end]).into_owned()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tlv> {
        self.0.iter()
    }

    /// Parse TLVs until the buffer is exhausted. A truncated trailing TLV
    /// ends the loop instead of failing the whole PDU.
    pub fn parse(buf: &mut Bytes) -> Self {
        let mut map = TlvMap::new();
        while buf.remaining() >= 4 {
            let tag = buf.get_u16();
            let length = buf.get_u16() as usize;
            if buf.remaining() < length {
                break;
            }
            let value = buf.copy_to_bytes(length).to_vec();
            map.push(Tlv { tag, value });
        }
        map
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        for tlv in &self.0 {
            buf.put_u16(tlv.tag);
            buf.put_u16(tlv.value.len() as u16);
            buf.put_slice(&tlv.value);
        }
    }
}

impl FromIterator<Tlv> for TlvMap {
    fn from_iter<I: IntoIterator<Item = Tlv>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalized multi-part (SAR) message info from concatenation TLVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConcatInfo {
    pub reference: u16,
    pub total_parts: u8,
    pub sequence: u8,
}

impl ConcatInfo {
    /// Extract SAR info from a TLV map. Accepts both the 2-byte and the
    /// 1-byte encodings of the reference TLV; any one present field is
    /// enough to produce a result, missing fields default to zero.
    pub fn from_tlvs(tlvs: &TlvMap) -> Option<Self> {
        let reference = tlvs.get_u16(tags::SAR_MSG_REF_NUM);
        let total = tlvs.get_u8(tags::SAR_TOTAL_SEGMENTS);
        let sequence = tlvs.get_u8(tags::SAR_SEGMENT_SEQNUM);

        if reference.is_none() && total.is_none() && sequence.is_none() {
            return None;
        }

        Some(Self {
            reference: reference.unwrap_or(0),
            total_parts: total.unwrap_or(0),
            sequence: sequence.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_encode_round_trip() {
        let mut original = TlvMap::new();
        original.push(Tlv::new(tags::MESSAGE_STATE, vec![2]));
        original.push(Tlv::new(tags::RECEIPTED_MESSAGE_ID, b"MSG1\x00".to_vec()));

        let mut buf = BytesMut::new();
        original.encode(&mut buf);
        let parsed = TlvMap::parse(&mut buf.freeze());
        assert_eq!(parsed, original);
    }

    #[test]
    fn truncated_tlv_stops_loop() {
        let mut buf = BytesMut::new();
        buf.put_u16(tags::MESSAGE_STATE);
        buf.put_u16(1);
        buf.put_u8(2);
        // Second TLV claims 8 bytes but only 1 follows.
        buf.put_u16(tags::RECEIPTED_MESSAGE_ID);
        buf.put_u16(8);
        buf.put_u8(0x41);

        let parsed = TlvMap::parse(&mut buf.freeze());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get_u8(tags::MESSAGE_STATE), Some(2));
    }

    #[test]
    fn empty_body_parses_to_empty_map() {
        let parsed = TlvMap::parse(&mut Bytes::new());
        assert!(parsed.is_empty());
    }

    #[test]
    fn get_string_trims_trailing_nul() {
        let mut map = TlvMap::new();
        map.push(Tlv::new(tags::RECEIPTED_MESSAGE_ID, b"MSG42\x00".to_vec()));
        assert_eq!(map.get_string(tags::RECEIPTED_MESSAGE_ID).unwrap(), "MSG42");
    }

    #[test]
    fn concat_info_16bit() {
        let mut map = TlvMap::new();
        map.push(Tlv::new(tags::SAR_MSG_REF_NUM, vec![0x01, 0x02]));
        map.push(Tlv::new(tags::SAR_TOTAL_SEGMENTS, vec![3]));
        map.push(Tlv::new(tags::SAR_SEGMENT_SEQNUM, vec![2]));

        let info = ConcatInfo::from_tlvs(&map).unwrap();
        assert_eq!(info.reference, 0x0102);
        assert_eq!(info.total_parts, 3);
        assert_eq!(info.sequence, 2);
    }

    #[test]
    fn concat_info_8bit_reference() {
        let mut map = TlvMap::new();
        map.push(Tlv::new(tags::SAR_MSG_REF_NUM, vec![0x7F]));
        let info = ConcatInfo::from_tlvs(&map).unwrap();
        assert_eq!(info.reference, 0x7F);
        assert_eq!(info.total_parts, 0);
    }

    #[test]
    fn concat_info_single_field_is_enough() {
        let mut map = TlvMap::new();
        map.push(Tlv::new(tags::SAR_SEGMENT_SEQNUM, vec![1]));
        assert!(ConcatInfo::from_tlvs(&map).is_some());

        assert!(ConcatInfo::from_tlvs(&TlvMap::new()).is_none());
    }
}
