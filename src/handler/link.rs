//! Link management: enquire_link, unbind, generic_nack.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::protocol::{CommandId, Frame, Header, Pdu, Status};
use crate::session::Session;

use super::Action;

pub(super) fn enquire_link(sequence: u32) -> Action {
    Action::Reply(Pdu::EnquireLinkResp.to_frame(sequence, Status::Ok))
}

/// Acknowledge the unbind, then close. The account layer's session
/// record is released by the eviction hook when the session leaves the
/// registry.
pub(super) async fn unbind(session: &Arc<Session>, sequence: u32) -> Action {
    let system_id = session.system_id().await;
    info!(
        session_id = %session.id(),
        system_id = system_id.as_deref().unwrap_or("-"),
        "unbind"
    );
    Action::ReplyThenClose(Pdu::UnbindResp.to_frame(sequence, Status::Ok))
}

pub(super) fn generic_nack(sequence: u32, status: Status) -> Frame {
    Frame::new(
        Header::with_status(CommandId::GenericNack, sequence, status),
        Bytes::new(),
    )
}
