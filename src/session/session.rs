//! Per-connection session state.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::Instant;

use crate::protocol::Frame;

/// Process-unique session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// SMPP bind state machine. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Open,
    BoundRx,
    BoundTx,
    BoundTrx,
    Closed,
}

impl BindState {
    pub fn is_bound(self) -> bool {
        matches!(self, BindState::BoundRx | BindState::BoundTx | BindState::BoundTrx)
    }

    /// Whether the client may submit messages to the server.
    pub fn can_transmit(self) -> bool {
        matches!(self, BindState::BoundTx | BindState::BoundTrx)
    }

    /// Whether the server may deliver messages to the client.
    pub fn can_receive(self) -> bool {
        matches!(self, BindState::BoundRx | BindState::BoundTrx)
    }

    pub fn name(self) -> &'static str {
        match self {
            BindState::Open => "open",
            BindState::BoundRx => "bound_rx",
            BindState::BoundTx => "bound_tx",
            BindState::BoundTrx => "bound_trx",
            BindState::Closed => "closed",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] crate::protocol::CodecError),

    #[error("outbound queue full")]
    QueueFull,

    #[error("session closed")]
    Closed,

    #[error("write timed out")]
    WriteTimeout,
}

/// Identity attached to a session by a successful bind.
#[derive(Debug, Clone, Default)]
struct Identity {
    system_id: Option<String>,
    system_type: Option<String>,
}

/// Shared, task-safe view of one client connection.
///
/// The connection-driving task ([`super::SessionRunner`]) is the only
/// writer on the socket. Everything else, delivery routing included,
/// enqueues frames through [`Session::send_frame`].
pub struct Session {
    id: SessionId,
    peer: SocketAddr,
    state: RwLock<BindState>,
    identity: RwLock<Identity>,
    sequence: AtomicU32,
    last_activity: RwLock<Instant>,
    last_received: RwLock<Instant>,
    outbound: mpsc::Sender<Frame>,
    closing: AtomicBool,
    close_signal: Notify,
}

impl Session {
    pub fn new(peer: SocketAddr, outbound: mpsc::Sender<Frame>) -> Arc<Self> {
        let now = Instant::now();
        Arc::new(Self {
            id: SessionId::new(),
            peer,
            state: RwLock::new(BindState::Open),
            identity: RwLock::new(Identity::default()),
            sequence: AtomicU32::new(1),
            last_activity: RwLock::new(now),
            last_received: RwLock::new(now),
            outbound,
            closing: AtomicBool::new(false),
            close_signal: Notify::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub async fn state(&self) -> BindState {
        *self.state.read().await
    }

    /// Transition the bind state. `Closed` is sticky.
    pub async fn set_state(&self, next: BindState) {
        let mut state = self.state.write().await;
        if *state != BindState::Closed {
            *state = next;
        }
    }

    /// Record a successful bind: identity plus the bound state.
    pub async fn bind(&self, system_id: &str, system_type: &str, state: BindState) {
        {
            let mut identity = self.identity.write().await;
            identity.system_id = Some(system_id.to_string());
            identity.system_type = if system_type.is_empty() {
                None
            } else {
                Some(system_type.to_string())
            };
        }
        self.set_state(state).await;
    }

    pub async fn system_id(&self) -> Option<String> {
        self.identity.read().await.system_id.clone()
    }

    /// Next server-originated sequence number. Wraps within the
    /// 1..=0x7FFF_FFFF range the protocol allows.
    pub fn next_sequence(&self) -> u32 {
        loop {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            if seq != 0 && seq <= 0x7FFF_FFFF {
                return seq;
            }
            // Wrapped: reset and retry.
            let _ = self
                .sequence
                .compare_exchange(seq + 1, 1, Ordering::Relaxed, Ordering::Relaxed);
        }
    }

    /// Record any activity on the connection.
    pub async fn touch(&self) {
        *self.last_activity.write().await = Instant::now();
    }

    /// Record traffic received from the peer. Implies [`Self::touch`].
    pub async fn touch_received(&self) {
        let now = Instant::now();
        *self.last_activity.write().await = now;
        *self.last_received.write().await = now;
    }

    pub async fn idle_since(&self) -> Instant {
        *self.last_activity.read().await
    }

    pub async fn last_received(&self) -> Instant {
        *self.last_received.read().await
    }

    /// Queue a frame for the connection task to write. Never blocks; a
    /// slow consumer sheds load instead of stalling the caller.
    pub fn send_frame(&self, frame: Frame) -> Result<(), SessionError> {
        if self.is_closing() {
            return Err(SessionError::Closed);
        }
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }

    /// Ask the connection task to shut the socket down.
    pub fn request_close(&self) {
        if !self.closing.swap(true, Ordering::SeqCst) {
            self.close_signal.notify_waiters();
        }
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    pub(super) async fn closed(&self) {
        loop {
            // Create the waiter before re-checking the flag so a
            // request_close landing in between still wakes us.
            let notified = self.close_signal.notified();
            if self.is_closing() {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish()
    }
}
