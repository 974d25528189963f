//! Delivery-report fan-out to live sessions.

use std::sync::Arc;

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::protocol::command::{esm_class, registered_delivery};
use crate::protocol::tlv::{tags, Tlv, TlvMap};
use crate::protocol::{Address, Pdu, SmBody, Status};
use crate::session::SessionManager;
use crate::telemetry::counters;

use super::payload::DeliveryReportMessage;

/// Turns broker delivery reports into `deliver_sm` PDUs on every
/// receive-capable session of the owning account. At-most-once: no
/// session, or a full outbound queue, means the report is dropped with
/// a log line.
pub struct ReportRouter {
    sessions: Arc<SessionManager>,
}

impl ReportRouter {
    pub fn new(sessions: Arc<SessionManager>) -> Arc<Self> {
        Arc::new(Self { sessions })
    }

    pub async fn route(&self, report: DeliveryReportMessage) {
        let targets = self.sessions.sessions_for(&report.system_id);
        if targets.is_empty() {
            warn!(
                system_id = %report.system_id,
                message_id = %report.message_id,
                "no bound session for delivery report, dropping"
            );
            counters::report_dropped("no_session");
            return;
        }

        for session in targets {
            if !session.state().await.can_receive() {
                continue;
            }
            let sequence = session.next_sequence();
            let frame = build_deliver_sm(&report).to_frame(sequence, Status::Ok);
            match session.send_frame(frame) {
                Ok(()) => {
                    debug!(
                        session_id = %session.id(),
                        message_id = %report.message_id,
                        sequence,
                        "delivery report queued"
                    );
                    counters::report_delivered(&report.system_id);
                }
                Err(err) => {
                    warn!(
                        session_id = %session.id(),
                        message_id = %report.message_id,
                        error = %err,
                        "failed to queue delivery report"
                    );
                    counters::report_dropped("send_failed");
                }
            }
        }
    }
}

/// The report flows back toward the originating client, so the
/// addresses swap: the report's destination becomes the deliver_sm
/// source.
fn build_deliver_sm(report: &DeliveryReportMessage) -> Pdu {
    let mut receipted_id = BytesMut::with_capacity(report.message_id.len() + 1);
    receipted_id.extend_from_slice(report.message_id.as_bytes());
    receipted_id.extend_from_slice(&[0]);

    let mut tlvs = TlvMap::new();
    tlvs.push(Tlv::new(tags::MESSAGE_STATE, vec![report.message_state]));
    tlvs.push(Tlv::new(tags::RECEIPTED_MESSAGE_ID, receipted_id.to_vec()));

    Pdu::DeliverSm(Box::new(SmBody {
        source: Address::new(0, 0, report.destination_addr.clone()),
        dest: Address::new(0, 0, report.source_addr.clone()),
        esm_class: esm_class::DEFAULT,
        registered_delivery: registered_delivery::SMSC_RECEIPT,
        short_message: Vec::new(),
        tlvs,
        ..Default::default()
    }))
}
