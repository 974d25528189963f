//! JSON payloads exchanged over the broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::tlv::ConcatInfo;

/// Accepted outbound message, published to the submit queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSmMessage {
    pub message_id: String,
    pub system_id: String,
    pub source_addr: String,
    pub destination_addr: String,
    /// Text after data_coding-aware decode.
    pub short_message: String,
    pub data_coding: u8,
    pub registered_delivery: u8,
    /// Present when the client sent SAR TLVs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concat: Option<ConcatInfo>,
    pub submitted_at: DateTime<Utc>,
}

/// Delivery status update consumed from the report queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReportMessage {
    pub message_id: String,
    pub system_id: String,
    pub source_addr: String,
    pub destination_addr: String,
    /// SMPP message_state value (2 = delivered, 5 = undeliverable, ...).
    pub message_state: u8,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}
