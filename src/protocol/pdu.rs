//! Per-command PDU body parsing and serialization.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::codec::{CodecError, Frame, Header};
use super::command::CommandId;
use super::status::Status;
use super::tlv::TlvMap;

/// Read a C-octet string: bytes up to and consuming the next NUL. A
/// missing terminator consumes the remainder, which keeps short bodies
/// from poisoning otherwise-parsable PDUs.
fn take_cstring(buf: &mut Bytes) -> String {
    match buf.iter().position(|&b| b == 0) {
        Some(pos) => {
            let raw = buf.split_to(pos);
            buf.advance(1); // the NUL
            String::from_utf8_lossy(&raw).into_owned()
        }
        None => {
            let raw = buf.split_to(buf.len());
            String::from_utf8_lossy(&raw).into_owned()
        }
    }
}

fn take_u8(buf: &mut Bytes) -> Option<u8> {
    if buf.has_remaining() {
        Some(buf.get_u8())
    } else {
        None
    }
}

fn require_u8(buf: &mut Bytes, command: &'static str, field: &'static str) -> Result<u8, CodecError> {
    take_u8(buf).ok_or(CodecError::Truncated { command, field })
}

fn put_cstring(buf: &mut BytesMut, value: &str) {
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
}

/// SMPP address triple: type-of-number, numbering plan, digits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub ton: u8,
    pub npi: u8,
    pub addr: String,
}

impl Address {
    pub fn new(ton: u8, npi: u8, addr: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            addr: addr.into(),
        }
    }

    fn parse(buf: &mut Bytes, command: &'static str, field: &'static str) -> Result<Self, CodecError> {
        let ton = require_u8(buf, command, field)?;
        let npi = require_u8(buf, command, field)?;
        let addr = take_cstring(buf);
        Ok(Self { ton, npi, addr })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.ton);
        buf.put_u8(self.npi);
        put_cstring(buf, &self.addr);
    }
}

/// Body of the three bind request variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindBody {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
}

impl BindBody {
    /// Parse a bind body. Trailing fields past `system_type` default to
    /// zero values when absent; real clients do send short binds.
    fn parse(mut buf: Bytes) -> Self {
        let system_id = take_cstring(&mut buf);
        let password = take_cstring(&mut buf);
        let system_type = take_cstring(&mut buf);
        let interface_version = take_u8(&mut buf).unwrap_or(0);
        let addr_ton = take_u8(&mut buf).unwrap_or(0);
        let addr_npi = take_u8(&mut buf).unwrap_or(0);
        let address_range = if buf.has_remaining() {
            take_cstring(&mut buf)
        } else {
            String::new()
        };
        Self {
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id);
        put_cstring(buf, &self.password);
        put_cstring(buf, &self.system_type);
        buf.put_u8(self.interface_version);
        buf.put_u8(self.addr_ton);
        buf.put_u8(self.addr_npi);
        put_cstring(buf, &self.address_range);
    }
}

/// Body of the bind response variants: the accepted system_id only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindRespBody {
    pub system_id: String,
    pub tlvs: TlvMap,
}

impl BindRespBody {
    pub fn new(system_id: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            tlvs: TlvMap::new(),
        }
    }

    fn parse(mut buf: Bytes) -> Self {
        let system_id = take_cstring(&mut buf);
        let tlvs = TlvMap::parse(&mut buf);
        Self { system_id, tlvs }
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id);
        self.tlvs.encode(buf);
    }
}

/// Shared body of `submit_sm` and `deliver_sm` (identical wire shape).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmBody {
    pub service_type: String,
    pub source: Address,
    pub dest: Address,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Vec<u8>,
    pub tlvs: TlvMap,
}

impl SmBody {
    fn parse(mut buf: Bytes, command: &'static str) -> Result<Self, CodecError> {
        let service_type = take_cstring(&mut buf);
        let source = Address::parse(&mut buf, command, "source_addr")?;
        let dest = Address::parse(&mut buf, command, "destination_addr")?;
        let esm_class = require_u8(&mut buf, command, "esm_class")?;
        let protocol_id = require_u8(&mut buf, command, "protocol_id")?;
        let priority_flag = require_u8(&mut buf, command, "priority_flag")?;
        let schedule_delivery_time = take_cstring(&mut buf);
        let validity_period = take_cstring(&mut buf);
        let registered_delivery = require_u8(&mut buf, command, "registered_delivery")?;
        let replace_if_present = require_u8(&mut buf, command, "replace_if_present_flag")?;
        let data_coding = require_u8(&mut buf, command, "data_coding")?;
        let sm_default_msg_id = require_u8(&mut buf, command, "sm_default_msg_id")?;
        let sm_length = require_u8(&mut buf, command, "sm_length")? as usize;
        if buf.remaining() < sm_length {
            return Err(CodecError::Truncated {
                command,
                field: "short_message",
            });
        }
        let short_message = buf.copy_to_bytes(sm_length).to_vec();
        let tlvs = TlvMap::parse(&mut buf);

        Ok(Self {
            service_type,
            source,
            dest,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.service_type);
        self.source.encode(buf);
        self.dest.encode(buf);
        buf.put_u8(self.esm_class);
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag);
        put_cstring(buf, &self.schedule_delivery_time);
        put_cstring(buf, &self.validity_period);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present);
        buf.put_u8(self.data_coding);
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(self.short_message.len() as u8);
        buf.put_slice(&self.short_message);
        self.tlvs.encode(buf);
    }
}

/// Body of `submit_sm_resp`, `deliver_sm_resp` and `data_sm_resp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmRespBody {
    pub message_id: String,
    pub tlvs: TlvMap,
}

impl SmRespBody {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            tlvs: TlvMap::new(),
        }
    }

    fn parse(mut buf: Bytes) -> Self {
        let message_id = take_cstring(&mut buf);
        let tlvs = TlvMap::parse(&mut buf);
        Self { message_id, tlvs }
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id);
        self.tlvs.encode(buf);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySmBody {
    pub message_id: String,
    pub source: Address,
}

impl QuerySmBody {
    fn parse(mut buf: Bytes) -> Result<Self, CodecError> {
        let message_id = take_cstring(&mut buf);
        let source = Address::parse(&mut buf, "query_sm", "source_addr")?;
        Ok(Self { message_id, source })
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id);
        self.source.encode(buf);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySmRespBody {
    pub message_id: String,
    pub final_date: String,
    pub message_state: u8,
    pub error_code: u8,
}

impl QuerySmRespBody {
    fn parse(mut buf: Bytes) -> Self {
        let message_id = take_cstring(&mut buf);
        let final_date = take_cstring(&mut buf);
        let message_state = take_u8(&mut buf).unwrap_or(0);
        let error_code = take_u8(&mut buf).unwrap_or(0);
        Self {
            message_id,
            final_date,
            message_state,
            error_code,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id);
        put_cstring(buf, &self.final_date);
        buf.put_u8(self.message_state);
        buf.put_u8(self.error_code);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelSmBody {
    pub service_type: String,
    pub message_id: String,
    pub source: Address,
    pub dest: Address,
}

impl CancelSmBody {
    fn parse(mut buf: Bytes) -> Result<Self, CodecError> {
        let service_type = take_cstring(&mut buf);
        let message_id = take_cstring(&mut buf);
        let source = Address::parse(&mut buf, "cancel_sm", "source_addr")?;
        let dest = Address::parse(&mut buf, "cancel_sm", "destination_addr")?;
        Ok(Self {
            service_type,
            message_id,
            source,
            dest,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.service_type);
        put_cstring(buf, &self.message_id);
        self.source.encode(buf);
        self.dest.encode(buf);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceSmBody {
    pub message_id: String,
    pub source: Address,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Vec<u8>,
}

impl ReplaceSmBody {
    fn parse(mut buf: Bytes) -> Result<Self, CodecError> {
        let command = "replace_sm";
        let message_id = take_cstring(&mut buf);
        let source = Address::parse(&mut buf, command, "source_addr")?;
        let schedule_delivery_time = take_cstring(&mut buf);
        let validity_period = take_cstring(&mut buf);
        let registered_delivery = require_u8(&mut buf, command, "registered_delivery")?;
        let sm_default_msg_id = require_u8(&mut buf, command, "sm_default_msg_id")?;
        let sm_length = require_u8(&mut buf, command, "sm_length")? as usize;
        if buf.remaining() < sm_length {
            return Err(CodecError::Truncated {
                command,
                field: "short_message",
            });
        }
        let short_message = buf.copy_to_bytes(sm_length).to_vec();
        Ok(Self {
            message_id,
            source,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            sm_default_msg_id,
            short_message,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id);
        self.source.encode(buf);
        put_cstring(buf, &self.schedule_delivery_time);
        put_cstring(buf, &self.validity_period);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(self.short_message.len() as u8);
        buf.put_slice(&self.short_message);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSmBody {
    pub service_type: String,
    pub source: Address,
    pub dest: Address,
    pub esm_class: u8,
    pub registered_delivery: u8,
    pub data_coding: u8,
    pub tlvs: TlvMap,
}

impl DataSmBody {
    fn parse(mut buf: Bytes) -> Result<Self, CodecError> {
        let command = "data_sm";
        let service_type = take_cstring(&mut buf);
        let source = Address::parse(&mut buf, command, "source_addr")?;
        let dest = Address::parse(&mut buf, command, "destination_addr")?;
        let esm_class = require_u8(&mut buf, command, "esm_class")?;
        let registered_delivery = require_u8(&mut buf, command, "registered_delivery")?;
        let data_coding = require_u8(&mut buf, command, "data_coding")?;
        let tlvs = TlvMap::parse(&mut buf);
        Ok(Self {
            service_type,
            source,
            dest,
            esm_class,
            registered_delivery,
            data_coding,
            tlvs,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.service_type);
        self.source.encode(buf);
        self.dest.encode(buf);
        buf.put_u8(self.esm_class);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.data_coding);
        self.tlvs.encode(buf);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertNotificationBody {
    pub source: Address,
    pub esme: Address,
    pub tlvs: TlvMap,
}

impl AlertNotificationBody {
    fn parse(mut buf: Bytes) -> Result<Self, CodecError> {
        let source = Address::parse(&mut buf, "alert_notification", "source_addr")?;
        let esme = Address::parse(&mut buf, "alert_notification", "esme_addr")?;
        let tlvs = TlvMap::parse(&mut buf);
        Ok(Self { source, esme, tlvs })
    }

    fn encode(&self, buf: &mut BytesMut) {
        self.source.encode(buf);
        self.esme.encode(buf);
        self.tlvs.encode(buf);
    }
}

/// A decoded PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu {
    BindReceiver(BindBody),
    BindTransmitter(BindBody),
    BindTransceiver(BindBody),
    BindReceiverResp(BindRespBody),
    BindTransmitterResp(BindRespBody),
    BindTransceiverResp(BindRespBody),
    SubmitSm(Box<SmBody>),
    SubmitSmResp(SmRespBody),
    DeliverSm(Box<SmBody>),
    DeliverSmResp(SmRespBody),
    DataSm(DataSmBody),
    DataSmResp(SmRespBody),
    QuerySm(QuerySmBody),
    QuerySmResp(QuerySmRespBody),
    CancelSm(CancelSmBody),
    CancelSmResp,
    ReplaceSm(ReplaceSmBody),
    ReplaceSmResp,
    AlertNotification(AlertNotificationBody),
    EnquireLink,
    EnquireLinkResp,
    Unbind,
    UnbindResp,
    GenericNack,
    Unknown { command_id: u32, body: Bytes },
}

impl Pdu {
    /// Parse a frame's body according to its command id. Unknown command
    /// ids are preserved rather than rejected.
    pub fn parse(frame: &Frame) -> Result<Self, CodecError> {
        let body = frame.body.clone();
        let Some(command) = frame.header.command() else {
            return Ok(Pdu::Unknown {
                command_id: frame.header.command_id,
                body,
            });
        };

        let pdu = match command {
            CommandId::BindReceiver => Pdu::BindReceiver(BindBody::parse(body)),
            CommandId::BindTransmitter => Pdu::BindTransmitter(BindBody::parse(body)),
            CommandId::BindTransceiver => Pdu::BindTransceiver(BindBody::parse(body)),
            CommandId::BindReceiverResp => Pdu::BindReceiverResp(BindRespBody::parse(body)),
            CommandId::BindTransmitterResp => Pdu::BindTransmitterResp(BindRespBody::parse(body)),
            CommandId::BindTransceiverResp => Pdu::BindTransceiverResp(BindRespBody::parse(body)),
            CommandId::SubmitSm => Pdu::SubmitSm(Box::new(SmBody::parse(body, "submit_sm")?)),
            CommandId::SubmitSmResp => Pdu::SubmitSmResp(SmRespBody::parse(body)),
            CommandId::DeliverSm => Pdu::DeliverSm(Box::new(SmBody::parse(body, "deliver_sm")?)),
            CommandId::DeliverSmResp => Pdu::DeliverSmResp(SmRespBody::parse(body)),
            CommandId::DataSm => Pdu::DataSm(DataSmBody::parse(body)?),
            CommandId::DataSmResp => Pdu::DataSmResp(SmRespBody::parse(body)),
            CommandId::QuerySm => Pdu::QuerySm(QuerySmBody::parse(body)?),
            CommandId::QuerySmResp => Pdu::QuerySmResp(QuerySmRespBody::parse(body)),
            CommandId::CancelSm => Pdu::CancelSm(CancelSmBody::parse(body)?),
            CommandId::CancelSmResp => Pdu::CancelSmResp,
            CommandId::ReplaceSm => Pdu::ReplaceSm(ReplaceSmBody::parse(body)?),
            CommandId::ReplaceSmResp => Pdu::ReplaceSmResp,
            CommandId::AlertNotification => {
                Pdu::AlertNotification(AlertNotificationBody::parse(body)?)
            }
            CommandId::EnquireLink => Pdu::EnquireLink,
            CommandId::EnquireLinkResp => Pdu::EnquireLinkResp,
            CommandId::Unbind => Pdu::Unbind,
            CommandId::UnbindResp => Pdu::UnbindResp,
            CommandId::GenericNack => Pdu::GenericNack,
            CommandId::Outbind => Pdu::Unknown {
                command_id: frame.header.command_id,
                body,
            },
        };
        Ok(pdu)
    }

    /// Command id, when this is a known PDU type.
    pub fn command(&self) -> Option<CommandId> {
        use Pdu::*;
        let id = match self {
            BindReceiver(_) => CommandId::BindReceiver,
            BindTransmitter(_) => CommandId::BindTransmitter,
            BindTransceiver(_) => CommandId::BindTransceiver,
            BindReceiverResp(_) => CommandId::BindReceiverResp,
            BindTransmitterResp(_) => CommandId::BindTransmitterResp,
            BindTransceiverResp(_) => CommandId::BindTransceiverResp,
            SubmitSm(_) => CommandId::SubmitSm,
            SubmitSmResp(_) => CommandId::SubmitSmResp,
            DeliverSm(_) => CommandId::DeliverSm,
            DeliverSmResp(_) => CommandId::DeliverSmResp,
            DataSm(_) => CommandId::DataSm,
            DataSmResp(_) => CommandId::DataSmResp,
            QuerySm(_) => CommandId::QuerySm,
            QuerySmResp(_) => CommandId::QuerySmResp,
            CancelSm(_) => CommandId::CancelSm,
            CancelSmResp => CommandId::CancelSmResp,
            ReplaceSm(_) => CommandId::ReplaceSm,
            ReplaceSmResp => CommandId::ReplaceSmResp,
            AlertNotification(_) => CommandId::AlertNotification,
            EnquireLink => CommandId::EnquireLink,
            EnquireLinkResp => CommandId::EnquireLinkResp,
            Unbind => CommandId::Unbind,
            UnbindResp => CommandId::UnbindResp,
            GenericNack => CommandId::GenericNack,
            Unknown { .. } => return None,
        };
        Some(id)
    }

    /// Raw command id, defined for every variant.
    pub fn raw_command_id(&self) -> u32 {
        match self {
            Pdu::Unknown { command_id, .. } => *command_id,
            other => other.command().map(CommandId::as_u32).unwrap_or(0),
        }
    }

    /// Serialize this PDU's body.
    pub fn encode_body(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Pdu::BindReceiver(b) | Pdu::BindTransmitter(b) | Pdu::BindTransceiver(b) => {
                b.encode(&mut buf)
            }
            Pdu::BindReceiverResp(b) | Pdu::BindTransmitterResp(b) | Pdu::BindTransceiverResp(b) => {
                b.encode(&mut buf)
            }
            Pdu::SubmitSm(b) | Pdu::DeliverSm(b) => b.encode(&mut buf),
            Pdu::SubmitSmResp(b) | Pdu::DeliverSmResp(b) | Pdu::DataSmResp(b) => b.encode(&mut buf),
            Pdu::DataSm(b) => b.encode(&mut buf),
            Pdu::QuerySm(b) => b.encode(&mut buf),
            Pdu::QuerySmResp(b) => b.encode(&mut buf),
            Pdu::CancelSm(b) => b.encode(&mut buf),
            Pdu::ReplaceSm(b) => b.encode(&mut buf),
            Pdu::AlertNotification(b) => b.encode(&mut buf),
            Pdu::CancelSmResp
            | Pdu::ReplaceSmResp
            | Pdu::EnquireLink
            | Pdu::EnquireLinkResp
            | Pdu::Unbind
            | Pdu::UnbindResp
            | Pdu::GenericNack => {}
            Pdu::Unknown { body, .. } => buf.put_slice(body),
        }
        buf.freeze()
    }

    /// Build a wire frame carrying this PDU.
    pub fn to_frame(&self, sequence_number: u32, status: Status) -> Frame {
        Frame {
            header: Header {
                command_id: self.raw_command_id(),
                command_status: status.as_u32(),
                sequence_number,
            },
            body: self.encode_body(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::{data_coding, registered_delivery, ton};
    use crate::protocol::tlv::{tags, Tlv};

    fn round_trip(pdu: Pdu) -> Pdu {
        let frame = pdu.to_frame(42, Status::Ok);
        let parsed = Pdu::parse(&frame).unwrap();
        assert_eq!(frame.header.sequence_number, 42);
        parsed
    }

    fn sample_sm_body() -> SmBody {
        SmBody {
            service_type: String::new(),
            source: Address::new(ton::UNKNOWN, 0, "1000"),
            dest: Address::new(ton::INTERNATIONAL, 1, "+15551234567"),
            esm_class: 0,
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: registered_delivery::SMSC_RECEIPT,
            replace_if_present: 0,
            data_coding: data_coding::GSM7,
            sm_default_msg_id: 0,
            short_message: b"Hi".to_vec(),
            tlvs: TlvMap::new(),
        }
    }

    #[test]
    fn bind_round_trip() {
        let body = BindBody {
            system_id: "alice".into(),
            password: "secret".into(),
            system_type: "SMPP".into(),
            interface_version: 0x34,
            addr_ton: ton::INTERNATIONAL,
            addr_npi: 1,
            address_range: String::new(),
        };
        let parsed = round_trip(Pdu::BindTransceiver(body.clone()));
        assert_eq!(parsed, Pdu::BindTransceiver(body));
    }

    #[test]
    fn bind_parses_short_body_gracefully() {
        // Only system_id, password and system_type present: a short bind.
        let mut raw = BytesMut::new();
        raw.put_slice(b"alice\0secret\0\0");
        let frame = Frame::new(Header::new(CommandId::BindTransceiver, 1), raw.freeze());

        let parsed = Pdu::parse(&frame).unwrap();
        let Pdu::BindTransceiver(body) = parsed else {
            panic!("wrong variant");
        };
        assert_eq!(body.system_id, "alice");
        assert_eq!(body.password, "secret");
        assert_eq!(body.interface_version, 0);
        assert_eq!(body.addr_ton, 0);
        assert_eq!(body.address_range, "");
    }

    #[test]
    fn bind_resp_round_trip_with_empty_system_id() {
        let parsed = round_trip(Pdu::BindReceiverResp(BindRespBody::new("")));
        assert_eq!(parsed, Pdu::BindReceiverResp(BindRespBody::new("")));
    }

    #[test]
    fn submit_sm_round_trip() {
        let body = sample_sm_body();
        let parsed = round_trip(Pdu::SubmitSm(Box::new(body.clone())));
        assert_eq!(parsed, Pdu::SubmitSm(Box::new(body)));
    }

    #[test]
    fn deliver_sm_shares_submit_wire_shape() {
        let body = sample_sm_body();
        let as_submit = Pdu::SubmitSm(Box::new(body.clone())).encode_body();
        let as_deliver = Pdu::DeliverSm(Box::new(body)).encode_body();
        assert_eq!(as_submit, as_deliver);
    }

    #[test]
    fn submit_sm_with_tlvs_round_trip() {
        let mut body = sample_sm_body();
        body.tlvs.push(Tlv::new(tags::SAR_MSG_REF_NUM, vec![0x00, 0x07]));
        body.tlvs.push(Tlv::new(tags::SAR_TOTAL_SEGMENTS, vec![2]));
        body.tlvs.push(Tlv::new(tags::SAR_SEGMENT_SEQNUM, vec![1]));
        let parsed = round_trip(Pdu::SubmitSm(Box::new(body.clone())));
        assert_eq!(parsed, Pdu::SubmitSm(Box::new(body)));
    }

    #[test]
    fn submit_sm_truncated_body_is_an_error() {
        let frame = Frame::new(
            Header::new(CommandId::SubmitSm, 1),
            Bytes::from_static(b"\0\x00\x00src\0"),
        );
        let err = Pdu::parse(&frame).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn submit_sm_short_message_longer_than_body_is_an_error() {
        let mut body = sample_sm_body();
        body.short_message = b"Hello".to_vec();
        let mut frame = Pdu::SubmitSm(Box::new(body)).to_frame(1, Status::Ok);
        // Chop two bytes off the short message.
        frame.body = frame.body.slice(..frame.body.len() - 2);
        let err = Pdu::parse(&frame).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated {
                field: "short_message",
                ..
            }
        ));
    }

    #[test]
    fn sm_resp_round_trip() {
        let parsed = round_trip(Pdu::SubmitSmResp(SmRespBody::new("MSG20240101120000")));
        assert_eq!(parsed, Pdu::SubmitSmResp(SmRespBody::new("MSG20240101120000")));
    }

    #[test]
    fn query_cancel_replace_round_trips() {
        let query = QuerySmBody {
            message_id: "MSG1".into(),
            source: Address::new(1, 1, "1000"),
        };
        assert_eq!(round_trip(Pdu::QuerySm(query.clone())), Pdu::QuerySm(query));

        let cancel = CancelSmBody {
            service_type: String::new(),
            message_id: "MSG1".into(),
            source: Address::new(1, 1, "1000"),
            dest: Address::new(1, 1, "2000"),
        };
        assert_eq!(round_trip(Pdu::CancelSm(cancel.clone())), Pdu::CancelSm(cancel));

        let replace = ReplaceSmBody {
            message_id: "MSG1".into(),
            source: Address::new(1, 1, "1000"),
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            sm_default_msg_id: 0,
            short_message: b"new text".to_vec(),
        };
        assert_eq!(
            round_trip(Pdu::ReplaceSm(replace.clone())),
            Pdu::ReplaceSm(replace)
        );
    }

    #[test]
    fn data_sm_round_trip() {
        let mut tlvs = TlvMap::new();
        tlvs.push(Tlv::new(tags::MESSAGE_PAYLOAD, b"payload".to_vec()));
        let body = DataSmBody {
            service_type: String::new(),
            source: Address::new(1, 1, "1000"),
            dest: Address::new(1, 1, "2000"),
            esm_class: 0,
            registered_delivery: 0,
            data_coding: 0,
            tlvs,
        };
        assert_eq!(round_trip(Pdu::DataSm(body.clone())), Pdu::DataSm(body));
    }

    #[test]
    fn alert_notification_round_trip() {
        let body = AlertNotificationBody {
            source: Address::new(1, 1, "1000"),
            esme: Address::new(1, 1, "2000"),
            tlvs: TlvMap::new(),
        };
        assert_eq!(
            round_trip(Pdu::AlertNotification(body.clone())),
            Pdu::AlertNotification(body)
        );
    }

    #[test]
    fn empty_body_pdus_round_trip() {
        for pdu in [
            Pdu::EnquireLink,
            Pdu::EnquireLinkResp,
            Pdu::Unbind,
            Pdu::UnbindResp,
            Pdu::GenericNack,
            Pdu::CancelSmResp,
            Pdu::ReplaceSmResp,
        ] {
            assert!(pdu.encode_body().is_empty());
            assert_eq!(round_trip(pdu.clone()), pdu);
        }
    }

    #[test]
    fn unknown_command_id_is_preserved() {
        let frame = Frame::new(
            Header {
                command_id: 0x0000_00FE,
                command_status: 0,
                sequence_number: 5,
            },
            Bytes::from_static(b"\x01\x02"),
        );
        let parsed = Pdu::parse(&frame).unwrap();
        let Pdu::Unknown { command_id, body } = parsed else {
            panic!("wrong variant");
        };
        assert_eq!(command_id, 0x0000_00FE);
        assert_eq!(body.as_ref(), b"\x01\x02");
    }

    #[test]
    fn frame_length_invariant_holds_for_every_pdu() {
        use tokio_util::codec::Encoder;

        let pdus = vec![
            Pdu::BindTransceiver(BindBody::default()),
            Pdu::BindTransceiverResp(BindRespBody::new("smppgw")),
            Pdu::SubmitSm(Box::new(sample_sm_body())),
            Pdu::SubmitSmResp(SmRespBody::new("MSG1")),
            Pdu::DeliverSm(Box::new(sample_sm_body())),
            Pdu::EnquireLink,
            Pdu::GenericNack,
        ];
        for pdu in pdus {
            let frame = pdu.to_frame(1, Status::Ok);
            let mut buf = BytesMut::new();
            crate::protocol::SmppCodec::new().encode(frame, &mut buf).unwrap();
            let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
            assert_eq!(len, buf.len());
            assert!(len >= 16);
        }
    }
}
