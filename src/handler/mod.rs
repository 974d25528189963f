//! Per-command-family PDU handlers and the dispatch table in front of
//! them.
//!
//! Handlers never touch the socket. Each one validates bind state,
//! consults the account layer, and hands back an [`Action`] for the
//! connection task to execute, which keeps every handler unit-testable
//! without I/O.

mod bind;
mod deliver;
mod link;
mod stubs;
mod submit;

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::auth::AuthManager;
use crate::bridge::SubmitPublisher;
use crate::protocol::{CodecError, CommandId, Frame, Pdu, SmRespBody, Status};
use crate::session::{Session, SessionManager};
use crate::telemetry::counters;

/// What the connection task should do after a frame was handled.
#[derive(Debug)]
pub enum Action {
    /// Nothing to write.
    None,
    /// Write one reply and keep the session open.
    Reply(Frame),
    /// Write one reply, then close the session.
    ReplyThenClose(Frame),
    /// Close the session without replying.
    Close,
}

/// Routes decoded frames to the handler for their command family.
pub struct Dispatcher {
    auth: Arc<AuthManager>,
    sessions: Arc<SessionManager>,
    publisher: Arc<dyn SubmitPublisher>,
}

impl Dispatcher {
    pub fn new(
        auth: Arc<AuthManager>,
        sessions: Arc<SessionManager>,
        publisher: Arc<dyn SubmitPublisher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth,
            sessions,
            publisher,
        })
    }

    pub async fn dispatch(&self, session: &Arc<Session>, frame: Frame) -> Action {
        let sequence = frame.sequence();

        let pdu = match Pdu::parse(&frame) {
            Ok(pdu) => pdu,
            Err(err @ CodecError::Truncated { .. }) => {
                // Malformed body; the framing itself was sound, so the
                // session survives with an error response.
                warn!(
                    command = %frame.command_name(),
                    sequence,
                    error = %err,
                    "malformed PDU body"
                );
                counters::pdu_malformed(frame.command_name().as_str());
                return Action::Reply(malformed_reply(
                    frame.header.command_id,
                    sequence,
                    Status::InvalidCommandLength,
                ));
            }
            Err(err) => {
                warn!(sequence, error = %err, "unparsable PDU, closing");
                return Action::Close;
            }
        };

        match pdu {
            Pdu::BindReceiver(body) => {
                bind::handle(self, session, sequence, CommandId::BindReceiver, body).await
            }
            Pdu::BindTransmitter(body) => {
                bind::handle(self, session, sequence, CommandId::BindTransmitter, body).await
            }
            Pdu::BindTransceiver(body) => {
                bind::handle(self, session, sequence, CommandId::BindTransceiver, body).await
            }

            Pdu::SubmitSm(body) => submit::handle(self, session, sequence, *body).await,
            Pdu::DeliverSm(body) => deliver::handle(self, session, sequence, *body).await,

            Pdu::DataSm(body) => stubs::data_sm(session, sequence, body).await,
            Pdu::QuerySm(body) => stubs::query_sm(session, sequence, body).await,
            Pdu::CancelSm(body) => stubs::cancel_sm(session, sequence, body).await,
            Pdu::ReplaceSm(body) => stubs::replace_sm(session, sequence, body).await,

            Pdu::EnquireLink => link::enquire_link(sequence),
            Pdu::Unbind => link::unbind(session, sequence).await,

            // Responses to server-originated traffic. Activity stamps
            // were already refreshed by the read path.
            Pdu::EnquireLinkResp => {
                trace!(sequence, "enquire_link_resp");
                Action::None
            }
            Pdu::DeliverSmResp(resp) => {
                trace!(sequence, message_id = %resp.message_id, "deliver_sm_resp");
                Action::None
            }
            Pdu::GenericNack => {
                debug!(sequence, "generic_nack from peer");
                Action::None
            }
            Pdu::UnbindResp => Action::None,

            // Commands this server never receives in a valid flow.
            Pdu::BindReceiverResp(_)
            | Pdu::BindTransmitterResp(_)
            | Pdu::BindTransceiverResp(_)
            | Pdu::SubmitSmResp(_)
            | Pdu::DataSmResp(_)
            | Pdu::QuerySmResp(_)
            | Pdu::CancelSmResp
            | Pdu::ReplaceSmResp
            | Pdu::AlertNotification(_) => {
                debug!(command = %frame.command_name(), sequence, "unexpected PDU, ignoring");
                Action::None
            }

            Pdu::Unknown { command_id, .. } => {
                warn!(command_id = format_args!("{command_id:#010x}"), sequence, "unknown command id");
                counters::pdu_unknown_command();
                Action::Reply(link::generic_nack(sequence, Status::SystemError))
            }
        }
    }

    pub(super) fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub(super) fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub(super) fn publisher(&self) -> &dyn SubmitPublisher {
        &*self.publisher
    }
}

/// Error reply for a request whose body failed to parse. Uses the
/// matching response command where the family has one, otherwise a
/// generic_nack.
fn malformed_reply(command_id: u32, sequence: u32, status: Status) -> Frame {
    let reply = match CommandId::from_u32(command_id) {
        Some(CommandId::SubmitSm) => Pdu::SubmitSmResp(SmRespBody::default()),
        Some(CommandId::DeliverSm) => Pdu::DeliverSmResp(SmRespBody::default()),
        Some(CommandId::DataSm) => Pdu::DataSmResp(SmRespBody::default()),
        Some(CommandId::QuerySm) => Pdu::QuerySmResp(Default::default()),
        Some(CommandId::CancelSm) => Pdu::CancelSmResp,
        Some(CommandId::ReplaceSm) => Pdu::ReplaceSmResp,
        _ => Pdu::GenericNack,
    };
    reply.to_frame(sequence, status)
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fixtures for handler tests.

    use std::sync::Arc;

    use tokio::sync::{mpsc, Mutex};

    use crate::auth::{AuthManager, AuthUser, MemoryAuthStore, RateLimiter};
    use crate::bridge::{BridgeError, SubmitPublisher, SubmitSmMessage};
    use crate::protocol::Frame;
    use crate::session::{Session, SessionManager};

    use super::Dispatcher;

    /// Publisher that records every message, optionally failing.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<SubmitSmMessage>>,
        pub fail: bool,
    }

    #[async_trait::async_trait]
    impl SubmitPublisher for RecordingPublisher {
        async fn publish_submit(&self, message: &SubmitSmMessage) -> Result<(), BridgeError> {
            if self.fail {
                return Err(BridgeError::NotConnected);
            }
            self.published.lock().await.push(message.clone());
            Ok(())
        }
    }

    pub struct Fixture {
        pub dispatcher: Arc<Dispatcher>,
        pub sessions: Arc<SessionManager>,
        pub publisher: Arc<RecordingPublisher>,
    }

    pub fn fixture(users: Vec<AuthUser>) -> Fixture {
        let auth = AuthManager::new(Arc::new(MemoryAuthStore::new(users)), RateLimiter::new());
        let sessions = SessionManager::new(16);
        let publisher = Arc::new(RecordingPublisher::default());
        let dispatcher = Dispatcher::new(auth, sessions.clone(), publisher.clone());
        Fixture {
            dispatcher,
            sessions,
            publisher,
        }
    }

    pub fn user(system_id: &str, password: &str) -> AuthUser {
        AuthUser {
            system_id: system_id.into(),
            password: password.into(),
            max_sessions: 5,
            active: true,
            smpp_tps: String::new(),
            http_tps: String::new(),
            online: false,
            last_ip: None,
            online_at: None,
            offline_at: None,
            connection_count: 0,
            messages_sent: 0,
            messages_received: 0,
        }
    }

    pub fn session() -> (Arc<Session>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(16);
        (Session::new("127.0.0.1:40000".parse().unwrap(), tx), rx)
    }
}
