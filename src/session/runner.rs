//! Connection-driving task: owns the socket, serializes all writes.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, error, trace, warn};

use crate::handler::{Action, Dispatcher};
use crate::protocol::{CodecError, CommandId, Frame, Header, SmppCodec, Status};
use crate::telemetry::counters;

use super::session::{BindState, Session, SessionError};

/// Timing knobs for one connection. All are configurable so tests can
/// run them at millisecond scale.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How long a single read may block before the loop re-checks
    /// timers. Expiry is not an error.
    pub read_timeout: Duration,
    /// Budget for flushing one frame to the peer.
    pub write_timeout: Duration,
    /// Keepalive probe interval for bound sessions.
    pub enquire_link_interval: Duration,
    /// Close the link when nothing has been received for this long.
    pub link_dead_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            enquire_link_interval: Duration::from_secs(60),
            link_dead_timeout: Duration::from_secs(120),
        }
    }
}

/// Drives one client connection until it closes.
///
/// All socket writes happen here, in one task: replies produced by the
/// dispatcher, frames queued by other tasks through the session's
/// outbound channel, and keepalive probes. That single-writer rule is
/// what keeps concurrent deliver_sm traffic from interleaving bytes.
pub struct SessionRunner<T> {
    session: Arc<Session>,
    framed: Framed<T, SmppCodec>,
    outbound: mpsc::Receiver<Frame>,
    dispatcher: Arc<Dispatcher>,
    config: RunnerConfig,
}

impl<T> SessionRunner<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        session: Arc<Session>,
        stream: T,
        outbound: mpsc::Receiver<Frame>,
        dispatcher: Arc<Dispatcher>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            session,
            framed: Framed::new(stream, SmppCodec::new()),
            outbound,
            dispatcher,
            config,
        }
    }

    /// Run until the peer disconnects, the link goes dead, or close is
    /// requested. The session is left in `Closed` state; unregistering
    /// it from the session table is the caller's job.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let start = tokio::time::Instant::now();
        let mut keepalive =
            tokio::time::interval_at(start + self.config.enquire_link_interval, self.config.enquire_link_interval);
        keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let result = loop {
            tokio::select! {
                inbound = timeout(self.config.read_timeout, self.framed.next()) => {
                    match inbound {
                        Ok(Some(Ok(frame))) => {
                            self.session.touch_received().await;
                            counters::pdu_received(frame.command_name().as_str());
                            if !self.handle_frame(frame).await? {
                                break Ok(());
                            }
                        }
                        Ok(Some(Err(err))) => {
                            break self.handle_decode_error(err.into()).await;
                        }
                        Ok(None) => {
                            debug!("peer closed connection");
                            break Ok(());
                        }
                        Err(_) => {
                            // Read deadline passed with no traffic; the
                            // keepalive arm decides whether the link is dead.
                            trace!("read timeout, continuing");
                        }
                    }
                }

                queued = self.outbound.recv() => {
                    match queued {
                        Some(frame) => self.write_frame(frame).await?,
                        None => {
                            debug!("outbound channel dropped");
                            break Ok(());
                        }
                    }
                }

                _ = keepalive.tick() => {
                    if !self.keepalive_tick().await? {
                        break Ok(());
                    }
                }

                _ = self.session.closed() => {
                    debug!("close requested");
                    break Ok(());
                }
            }
        };

        self.session.request_close();
        self.session.set_state(BindState::Closed).await;
        result
    }

    /// Dispatch one inbound frame. Returns `false` when the session
    /// should end.
    async fn handle_frame(&mut self, frame: Frame) -> Result<bool, SessionError> {
        match self.dispatcher.dispatch(&self.session, frame).await {
            Action::None => Ok(true),
            Action::Reply(reply) => {
                self.write_frame(reply).await?;
                Ok(true)
            }
            Action::ReplyThenClose(reply) => {
                self.write_frame(reply).await?;
                Ok(false)
            }
            Action::Close => Ok(false),
        }
    }

    /// A framing error is unrecoverable: the byte stream offset is
    /// lost. Nack the peer when the length itself was bad, then close.
    async fn handle_decode_error(&mut self, err: SessionError) -> Result<(), SessionError> {
        error!(error = %err, "decode error, closing session");
        counters::pdu_decode_error();
        if let SessionError::Codec(CodecError::InvalidLength { .. }) = &err {
            let nack = Frame::new(
                Header::with_status(CommandId::GenericNack, 0, Status::InvalidCommandLength),
                bytes::Bytes::new(),
            );
            // Best effort; the connection is going away either way.
            let _ = self.write_frame(nack).await;
        }
        Err(err)
    }

    /// Probe or pronounce the link dead.
    async fn keepalive_tick(&mut self) -> Result<bool, SessionError> {
        let silent = tokio::time::Instant::now()
            .saturating_duration_since(self.session.last_received().await);
        if silent >= self.config.link_dead_timeout {
            warn!(silent_secs = silent.as_secs(), "link dead, closing session");
            return Ok(false);
        }

        if self.session.state().await.is_bound() {
            let seq = self.session.next_sequence();
            let probe = Frame::new(Header::new(CommandId::EnquireLink, seq), bytes::Bytes::new());
            self.write_frame(probe).await?;
            trace!(sequence = seq, "enquire_link sent");
        }
        Ok(true)
    }

    async fn write_frame(&mut self, frame: Frame) -> Result<(), SessionError> {
        let name = frame.command_name();
        match timeout(self.config.write_timeout, self.framed.send(frame)).await {
            Ok(Ok(())) => {
                counters::pdu_sent(name.as_str());
                self.session.touch().await;
                Ok(())
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                warn!("write timed out, closing session");
                Err(SessionError::WriteTimeout)
            }
        }
    }
}
