//! data_sm and the query/cancel/replace family.
//!
//! These commands validate bind state and body shape but are not backed
//! by a message store, so the responses are structurally valid and
//! semantically empty. Intentional scope boundary, kept as such.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::protocol::command::message_state;
use crate::protocol::pdu::{
    CancelSmBody, DataSmBody, QuerySmBody, QuerySmRespBody, ReplaceSmBody,
};
use crate::protocol::{Pdu, SmRespBody, Status};
use crate::session::Session;

use super::Action;

pub(super) async fn data_sm(session: &Arc<Session>, sequence: u32, body: DataSmBody) -> Action {
    if !session.state().await.can_transmit() {
        return Action::Reply(
            Pdu::DataSmResp(SmRespBody::default()).to_frame(sequence, Status::InvalidBindStatus),
        );
    }
    debug!(session_id = %session.id(), dest = %body.dest.addr, "data_sm (no store, acknowledged only)");
    Action::Reply(Pdu::DataSmResp(SmRespBody::default()).to_frame(sequence, Status::Ok))
}

pub(super) async fn query_sm(session: &Arc<Session>, sequence: u32, body: QuerySmBody) -> Action {
    if !session.state().await.can_transmit() {
        return Action::Reply(
            Pdu::QuerySmResp(QuerySmRespBody::default())
                .to_frame(sequence, Status::InvalidBindStatus),
        );
    }
    // No message store to consult; echo the id as ENROUTE.
    let resp = QuerySmRespBody {
        message_id: body.message_id,
        final_date: Utc::now().format("%y%m%d%H%M%S").to_string(),
        message_state: message_state::ENROUTE,
        error_code: 0,
    };
    Action::Reply(Pdu::QuerySmResp(resp).to_frame(sequence, Status::Ok))
}

pub(super) async fn cancel_sm(session: &Arc<Session>, sequence: u32, body: CancelSmBody) -> Action {
    if !session.state().await.can_transmit() {
        return Action::Reply(Pdu::CancelSmResp.to_frame(sequence, Status::InvalidBindStatus));
    }
    debug!(session_id = %session.id(), message_id = %body.message_id, "cancel_sm (no store, acknowledged only)");
    Action::Reply(Pdu::CancelSmResp.to_frame(sequence, Status::Ok))
}

pub(super) async fn replace_sm(session: &Arc<Session>, sequence: u32, body: ReplaceSmBody) -> Action {
    if !session.state().await.can_transmit() {
        return Action::Reply(Pdu::ReplaceSmResp.to_frame(sequence, Status::InvalidBindStatus));
    }
    debug!(session_id = %session.id(), message_id = %body.message_id, "replace_sm (no store, acknowledged only)");
    Action::Reply(Pdu::ReplaceSmResp.to_frame(sequence, Status::Ok))
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{fixture, session, user};
    use super::super::Action;
    use crate::protocol::pdu::{CancelSmBody, QuerySmBody};
    use crate::protocol::{Address, CommandId, Pdu, Status};
    use crate::session::BindState;

    #[tokio::test]
    async fn query_sm_requires_transmit_capability() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();
        session.bind("alice", "", BindState::BoundRx).await;

        let frame = Pdu::QuerySm(QuerySmBody {
            message_id: "MSG1".into(),
            source: Address::new(0, 0, "1000"),
        })
        .to_frame(2, Status::Ok);

        let Action::Reply(reply) = fx.dispatcher.dispatch(&session, frame).await else {
            panic!("expected reply");
        };
        assert_eq!(reply.header.command_status, Status::InvalidBindStatus.as_u32());
    }

    #[tokio::test]
    async fn query_sm_echoes_the_message_id() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();
        session.bind("alice", "", BindState::BoundTrx).await;

        let frame = Pdu::QuerySm(QuerySmBody {
            message_id: "MSG20240101120000".into(),
            source: Address::new(0, 0, "1000"),
        })
        .to_frame(2, Status::Ok);

        let Action::Reply(reply) = fx.dispatcher.dispatch(&session, frame).await else {
            panic!("expected reply");
        };
        assert_eq!(reply.header.command_status, Status::Ok.as_u32());
        let Pdu::QuerySmResp(resp) = Pdu::parse(&reply).unwrap() else {
            panic!("expected query_sm_resp");
        };
        assert_eq!(resp.message_id, "MSG20240101120000");
    }

    #[tokio::test]
    async fn cancel_sm_acknowledges_for_transmitters() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();
        session.bind("alice", "", BindState::BoundTx).await;

        let frame = Pdu::CancelSm(CancelSmBody {
            message_id: "MSG1".into(),
            source: Address::new(0, 0, "1000"),
            dest: Address::new(0, 0, "2000"),
            ..Default::default()
        })
        .to_frame(3, Status::Ok);

        let Action::Reply(reply) = fx.dispatcher.dispatch(&session, frame).await else {
            panic!("expected reply");
        };
        assert_eq!(reply.header.command_id, CommandId::CancelSmResp.as_u32());
        assert_eq!(reply.header.command_status, Status::Ok.as_u32());
    }
}
