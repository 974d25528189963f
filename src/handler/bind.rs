//! Bind request handling for all three bind variants.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::auth::SessionRecord;
use crate::protocol::{BindBody, BindRespBody, CommandId, Pdu, Status};
use crate::session::{BindState, Session};
use crate::telemetry::counters;

use super::{Action, Dispatcher};

/// Bound state and friendly name per bind variant.
fn bind_target(command: CommandId) -> (BindState, &'static str) {
    match command {
        CommandId::BindReceiver => (BindState::BoundRx, "receiver"),
        CommandId::BindTransmitter => (BindState::BoundTx, "transmitter"),
        _ => (BindState::BoundTrx, "transceiver"),
    }
}

fn resp_command(command: CommandId) -> CommandId {
    match command {
        CommandId::BindReceiver => CommandId::BindReceiverResp,
        CommandId::BindTransmitter => CommandId::BindTransmitterResp,
        _ => CommandId::BindTransceiverResp,
    }
}

fn reply(command: CommandId, sequence: u32, status: Status, system_id: &str) -> Action {
    let body = BindRespBody::new(system_id);
    let pdu = match resp_command(command) {
        CommandId::BindReceiverResp => Pdu::BindReceiverResp(body),
        CommandId::BindTransmitterResp => Pdu::BindTransmitterResp(body),
        _ => Pdu::BindTransceiverResp(body),
    };
    Action::Reply(pdu.to_frame(sequence, status))
}

pub(super) async fn handle(
    dispatcher: &Dispatcher,
    session: &Arc<Session>,
    sequence: u32,
    command: CommandId,
    body: BindBody,
) -> Action {
    let (target_state, bind_type) = bind_target(command);

    let state = session.state().await;
    if state != BindState::Open {
        warn!(
            session_id = %session.id(),
            state = state.name(),
            "bind attempt on non-open session"
        );
        return reply(command, sequence, Status::AlreadyBound, "");
    }

    // Cheap shape checks before the store is involved.
    if body.system_id.is_empty() {
        return reply(command, sequence, Status::InvalidSystemId, "");
    }
    if body.password.is_empty() {
        return reply(command, sequence, Status::InvalidPassword, "");
    }

    let user = match dispatcher.auth().authenticate(&body.system_id, &body.password).await {
        Ok(user) => user,
        Err(err) => {
            warn!(
                session_id = %session.id(),
                system_id = %body.system_id,
                error = %err,
                "bind authentication failed"
            );
            counters::bind_rejected(bind_type);
            return reply(command, sequence, err.status(), "");
        }
    };

    let record = SessionRecord {
        key: session.id().to_string(),
        system_id: user.system_id.clone(),
        remote_addr: session.peer().to_string(),
        bind_type: bind_type.to_string(),
        bound_at: Utc::now(),
    };
    if let Err(err) = dispatcher.auth().add_session(&user, record).await {
        counters::bind_rejected(bind_type);
        return reply(command, sequence, err.status(), "");
    }

    session
        .bind(&body.system_id, &body.system_type, target_state)
        .await;
    dispatcher.sessions().index_bound(session.id(), &body.system_id);

    counters::bind_accepted(bind_type);
    info!(
        session_id = %session.id(),
        system_id = %body.system_id,
        bind_type,
        "session bound"
    );

    reply(command, sequence, Status::Ok, &body.system_id)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{fixture, session, user};
    use super::*;
    use crate::protocol::Frame;

    fn bind_frame(command: CommandId, sequence: u32, system_id: &str, password: &str) -> Frame {
        let body = BindBody {
            system_id: system_id.into(),
            password: password.into(),
            interface_version: 0x34,
            ..Default::default()
        };
        let pdu = match command {
            CommandId::BindReceiver => Pdu::BindReceiver(body),
            CommandId::BindTransmitter => Pdu::BindTransmitter(body),
            _ => Pdu::BindTransceiver(body),
        };
        pdu.to_frame(sequence, Status::Ok)
    }

    fn expect_reply(action: Action) -> Frame {
        match action {
            Action::Reply(frame) => frame,
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_transceiver_bind_echoes_system_id() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();

        let action = fx
            .dispatcher
            .dispatch(&session, bind_frame(CommandId::BindTransceiver, 1, "alice", "secret"))
            .await;

        let reply = expect_reply(action);
        assert_eq!(reply.header.command_id, CommandId::BindTransceiverResp.as_u32());
        assert_eq!(reply.header.command_status, Status::Ok.as_u32());
        assert_eq!(reply.body.as_ref(), b"alice\0");
        assert_eq!(session.state().await, BindState::BoundTrx);
        assert_eq!(session.system_id().await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn receiver_and_transmitter_binds_set_directional_states() {
        let fx = fixture(vec![user("alice", "secret")]);

        let (rx_session, _a) = session();
        expect_reply(
            fx.dispatcher
                .dispatch(&rx_session, bind_frame(CommandId::BindReceiver, 1, "alice", "secret"))
                .await,
        );
        assert_eq!(rx_session.state().await, BindState::BoundRx);

        let (tx_session, _b) = session();
        expect_reply(
            fx.dispatcher
                .dispatch(&tx_session, bind_frame(CommandId::BindTransmitter, 1, "alice", "secret"))
                .await,
        );
        assert_eq!(tx_session.state().await, BindState::BoundTx);
    }

    #[tokio::test]
    async fn second_bind_on_bound_session_is_already_bound() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();

        expect_reply(
            fx.dispatcher
                .dispatch(&session, bind_frame(CommandId::BindTransceiver, 1, "alice", "secret"))
                .await,
        );
        let reply = expect_reply(
            fx.dispatcher
                .dispatch(&session, bind_frame(CommandId::BindTransceiver, 2, "alice", "secret"))
                .await,
        );

        assert_eq!(reply.header.command_status, Status::AlreadyBound.as_u32());
        assert_eq!(session.state().await, BindState::BoundTrx);
    }

    #[tokio::test]
    async fn empty_system_id_and_password_are_rejected_before_auth() {
        let fx = fixture(vec![]);
        let (session, _rx) = session();

        let reply = expect_reply(
            fx.dispatcher
                .dispatch(&session, bind_frame(CommandId::BindTransceiver, 1, "", "secret"))
                .await,
        );
        assert_eq!(reply.header.command_status, Status::InvalidSystemId.as_u32());

        let reply = expect_reply(
            fx.dispatcher
                .dispatch(&session, bind_frame(CommandId::BindTransceiver, 2, "alice", ""))
                .await,
        );
        assert_eq!(reply.header.command_status, Status::InvalidPassword.as_u32());
        assert_eq!(session.state().await, BindState::Open);
    }

    #[tokio::test]
    async fn unknown_system_id_answers_like_a_bad_password() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();

        let reply = expect_reply(
            fx.dispatcher
                .dispatch(&session, bind_frame(CommandId::BindTransceiver, 1, "ghost", "secret"))
                .await,
        );
        assert_eq!(reply.header.command_status, Status::InvalidPassword.as_u32());
        assert_eq!(session.state().await, BindState::Open);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let fx = fixture(vec![user("alice", "secret")]);
        let (session, _rx) = session();

        let reply = expect_reply(
            fx.dispatcher
                .dispatch(&session, bind_frame(CommandId::BindTransceiver, 1, "alice", "nope"))
                .await,
        );
        assert_eq!(reply.header.command_status, Status::InvalidPassword.as_u32());
        assert_eq!(session.state().await, BindState::Open);
    }

    #[tokio::test]
    async fn session_ceiling_rejects_with_already_bound() {
        let mut limited = user("alice", "secret");
        limited.max_sessions = 1;
        let fx = fixture(vec![limited]);

        let (first, _a) = session();
        expect_reply(
            fx.dispatcher
                .dispatch(&first, bind_frame(CommandId::BindTransceiver, 1, "alice", "secret"))
                .await,
        );

        let (second, _b) = session();
        let reply = expect_reply(
            fx.dispatcher
                .dispatch(&second, bind_frame(CommandId::BindTransceiver, 1, "alice", "secret"))
                .await,
        );
        assert_eq!(reply.header.command_status, Status::AlreadyBound.as_u32());
        assert_eq!(second.state().await, BindState::Open);
    }
}
