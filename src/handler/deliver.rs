//! deliver_sm arriving from the client side.

use std::sync::Arc;

use tracing::debug;

use crate::protocol::{Pdu, SmBody, SmRespBody, Status};
use crate::session::Session;

use super::{Action, Dispatcher};

fn reply(sequence: u32, status: Status) -> Action {
    Action::Reply(Pdu::DeliverSmResp(SmRespBody::default()).to_frame(sequence, status))
}

pub(super) async fn handle(
    dispatcher: &Dispatcher,
    session: &Arc<Session>,
    sequence: u32,
    body: SmBody,
) -> Action {
    if !session.state().await.can_receive() {
        return reply(sequence, Status::InvalidBindStatus);
    }

    if let Some(system_id) = session.system_id().await {
        dispatcher.auth().increment_message_count(&system_id, false).await;
    }

    debug!(
        session_id = %session.id(),
        source = %body.source.addr,
        dest = %body.dest.addr,
        "deliver_sm received"
    );

    reply(sequence, Status::Ok)
}
