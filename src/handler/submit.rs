//! submit_sm: validate, throttle, publish to the broker, respond.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::bridge::SubmitSmMessage;
use crate::protocol::tlv::ConcatInfo;
use crate::protocol::{text, Pdu, SmBody, SmRespBody, Status};
use crate::session::Session;
use crate::telemetry::counters;

use super::{Action, Dispatcher};

fn reply(sequence: u32, status: Status, message_id: &str) -> Action {
    Action::Reply(Pdu::SubmitSmResp(SmRespBody::new(message_id)).to_frame(sequence, status))
}

/// Server-generated message id: "MSG" plus a UTC second timestamp.
fn generate_message_id() -> String {
    format!("MSG{}", Utc::now().format("%Y%m%d%H%M%S"))
}

pub(super) async fn handle(
    dispatcher: &Dispatcher,
    session: &Arc<Session>,
    sequence: u32,
    body: SmBody,
) -> Action {
    if !session.state().await.can_transmit() {
        return reply(sequence, Status::InvalidBindStatus, "");
    }

    if body.source.addr.is_empty() {
        return reply(sequence, Status::InvalidSourceAddress, "");
    }
    if body.dest.addr.is_empty() {
        return reply(sequence, Status::InvalidDestAddress, "");
    }

    // Bound sessions always carry a system_id; guard anyway.
    let Some(system_id) = session.system_id().await else {
        return reply(sequence, Status::InvalidBindStatus, "");
    };

    if let Err(err) = dispatcher.auth().check_rate_limit(&system_id).await {
        counters::submit_throttled(&system_id);
        return reply(sequence, err.status(), "");
    }

    let message_id = generate_message_id();
    let short_message = text::decode_short_message(body.data_coding, &body.short_message);
    let concat = ConcatInfo::from_tlvs(&body.tlvs);

    dispatcher.auth().increment_message_count(&system_id, true).await;

    let message = SubmitSmMessage {
        message_id: message_id.clone(),
        system_id: system_id.clone(),
        source_addr: body.source.addr.clone(),
        destination_addr: body.dest.addr.clone(),
        short_message,
        data_coding: body.data_coding,
        registered_delivery: body.registered_delivery,
        concat,
        submitted_at: Utc::now(),
    };

    // Best effort: a broker outage must not fail the SMPP response.
    if let Err(err) = dispatcher.publisher().publish_submit(&message).await {
        warn!(
            session_id = %session.id(),
            message_id = %message_id,
            error = %err,
            "submit publish failed"
        );
        counters::submit_publish_failed();
    } else {
        counters::submit_accepted(&system_id);
    }

    debug!(
        session_id = %session.id(),
        message_id = %message_id,
        source = %body.source.addr,
        dest = %body.dest.addr,
        "submit_sm accepted"
    );

    reply(sequence, Status::Ok, &message_id)
}
