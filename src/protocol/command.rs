//! SMPP 3.4 command identifiers and fixed field constants.

/// Bit set on every response command id.
pub const RESPONSE_BIT: u32 = 0x8000_0000;

/// Command identifier for the PDUs this server exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    BindReceiver = 0x0000_0001,
    BindTransmitter = 0x0000_0002,
    QuerySm = 0x0000_0003,
    SubmitSm = 0x0000_0004,
    DeliverSm = 0x0000_0005,
    Unbind = 0x0000_0006,
    ReplaceSm = 0x0000_0007,
    CancelSm = 0x0000_0008,
    BindTransceiver = 0x0000_0009,
    Outbind = 0x0000_000B,
    EnquireLink = 0x0000_0015,
    AlertNotification = 0x0000_0102,
    DataSm = 0x0000_0103,
    BindReceiverResp = 0x8000_0001,
    BindTransmitterResp = 0x8000_0002,
    QuerySmResp = 0x8000_0003,
    SubmitSmResp = 0x8000_0004,
    DeliverSmResp = 0x8000_0005,
    UnbindResp = 0x8000_0006,
    ReplaceSmResp = 0x8000_0007,
    CancelSmResp = 0x8000_0008,
    BindTransceiverResp = 0x8000_0009,
    EnquireLinkResp = 0x8000_0015,
    DataSmResp = 0x8000_0103,
    GenericNack = 0x8000_0000,
}

impl CommandId {
    /// Raw wire value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decode a raw command id. Unknown ids stay raw so the dispatcher
    /// can answer them with `generic_nack` instead of dropping the link.
    pub fn from_u32(value: u32) -> Option<Self> {
        use CommandId::*;
        let id = match value {
            0x0000_0001 => BindReceiver,
            0x0000_0002 => BindTransmitter,
            0x0000_0003 => QuerySm,
            0x0000_0004 => SubmitSm,
            0x0000_0005 => DeliverSm,
            0x0000_0006 => Unbind,
            0x0000_0007 => ReplaceSm,
            0x0000_0008 => CancelSm,
            0x0000_0009 => BindTransceiver,
            0x0000_000B => Outbind,
            0x0000_0015 => EnquireLink,
            0x0000_0102 => AlertNotification,
            0x0000_0103 => DataSm,
            0x8000_0001 => BindReceiverResp,
            0x8000_0002 => BindTransmitterResp,
            0x8000_0003 => QuerySmResp,
            0x8000_0004 => SubmitSmResp,
            0x8000_0005 => DeliverSmResp,
            0x8000_0006 => UnbindResp,
            0x8000_0007 => ReplaceSmResp,
            0x8000_0008 => CancelSmResp,
            0x8000_0009 => BindTransceiverResp,
            0x8000_0015 => EnquireLinkResp,
            0x8000_0103 => DataSmResp,
            0x8000_0000 => GenericNack,
            _ => return None,
        };
        Some(id)
    }

    /// True for response PDUs (high bit set).
    pub fn is_response(self) -> bool {
        self.as_u32() & RESPONSE_BIT != 0
    }

    /// Short protocol name, for logs and counters.
    pub fn name(self) -> &'static str {
        use CommandId::*;
        match self {
            BindReceiver => "bind_receiver",
            BindTransmitter => "bind_transmitter",
            QuerySm => "query_sm",
            SubmitSm => "submit_sm",
            DeliverSm => "deliver_sm",
            Unbind => "unbind",
            ReplaceSm => "replace_sm",
            CancelSm => "cancel_sm",
            BindTransceiver => "bind_transceiver",
            Outbind => "outbind",
            EnquireLink => "enquire_link",
            AlertNotification => "alert_notification",
            DataSm => "data_sm",
            BindReceiverResp => "bind_receiver_resp",
            BindTransmitterResp => "bind_transmitter_resp",
            QuerySmResp => "query_sm_resp",
            SubmitSmResp => "submit_sm_resp",
            DeliverSmResp => "deliver_sm_resp",
            UnbindResp => "unbind_resp",
            ReplaceSmResp => "replace_sm_resp",
            CancelSmResp => "cancel_sm_resp",
            BindTransceiverResp => "bind_transceiver_resp",
            EnquireLinkResp => "enquire_link_resp",
            DataSmResp => "data_sm_resp",
            GenericNack => "generic_nack",
        }
    }
}

/// Type-of-number values.
pub mod ton {
    pub const UNKNOWN: u8 = 0x00;
    pub const INTERNATIONAL: u8 = 0x01;
    pub const NATIONAL: u8 = 0x02;
    pub const NETWORK_SPECIFIC: u8 = 0x03;
    pub const SUBSCRIBER_NUMBER: u8 = 0x04;
    pub const ALPHANUMERIC: u8 = 0x05;
    pub const ABBREVIATED: u8 = 0x06;
}

/// Numbering-plan-indicator values.
pub mod npi {
    pub const UNKNOWN: u8 = 0x00;
    pub const ISDN: u8 = 0x01;
    pub const DATA: u8 = 0x03;
    pub const TELEX: u8 = 0x04;
    pub const LAND_MOBILE: u8 = 0x06;
    pub const NATIONAL: u8 = 0x08;
    pub const PRIVATE: u8 = 0x09;
    pub const ERMES: u8 = 0x0A;
    pub const INTERNET: u8 = 0x0E;
    pub const WAP_CLIENT_ID: u8 = 0x12;
}

/// `data_coding` scheme values.
pub mod data_coding {
    pub const GSM7: u8 = 0x00;
    pub const ASCII: u8 = 0x01;
    pub const BINARY_8BIT_A: u8 = 0x02;
    pub const LATIN1: u8 = 0x03;
    pub const BINARY_8BIT: u8 = 0x04;
    pub const UCS2: u8 = 0x08;
}

/// `esm_class` bits.
pub mod esm_class {
    pub const DEFAULT: u8 = 0x00;
    /// Message-type bits flagging a delivery receipt (deliver_sm).
    pub const DELIVERY_RECEIPT: u8 = 0x04;
    /// GSM UDH indicator.
    pub const UDHI: u8 = 0x40;
}

/// `registered_delivery` bits.
pub mod registered_delivery {
    pub const NONE: u8 = 0x00;
    /// SMSC delivery receipt requested on final outcome.
    pub const SMSC_RECEIPT: u8 = 0x01;
}

/// `message_state` values carried in query responses and DLR TLVs.
pub mod message_state {
    pub const ENROUTE: u8 = 1;
    pub const DELIVERED: u8 = 2;
    pub const EXPIRED: u8 = 3;
    pub const DELETED: u8 = 4;
    pub const UNDELIVERABLE: u8 = 5;
    pub const ACCEPTED: u8 = 6;
    pub const UNKNOWN: u8 = 7;
    pub const REJECTED: u8 = 8;
}

/// SMPP 3.4 interface version byte.
pub const INTERFACE_VERSION_34: u8 = 0x34;
