//! Shared session table with a per-system-id index.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::session::{Session, SessionId};

/// Callback fired when a session leaves the table, however it died.
/// Lets the account layer release per-account session slots without the
/// session table owning a reference back to it.
#[async_trait]
pub trait EvictionHook: Send + Sync {
    async fn session_closed(&self, session: &Session);
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("session table full ({capacity} sessions)")]
    AtCapacity { capacity: usize },
}

/// Registry of live sessions.
///
/// Routing lookups come in two shapes: by session id (rare, mostly
/// tests) and by bound system_id (delivery report fan-out), so both are
/// indexed.
pub struct SessionManager {
    sessions: DashMap<SessionId, Arc<Session>>,
    by_system_id: DashMap<String, Vec<SessionId>>,
    capacity: usize,
    hook: RwLock<Option<Arc<dyn EvictionHook>>>,
}

impl SessionManager {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            by_system_id: DashMap::new(),
            capacity,
            hook: RwLock::new(None),
        })
    }

    /// Install the eviction hook. Done after construction so the hook
    /// may itself hold services built around this manager.
    pub async fn set_eviction_hook(&self, hook: Arc<dyn EvictionHook>) {
        *self.hook.write().await = Some(hook);
    }

    pub fn register(&self, session: Arc<Session>) -> Result<(), RegisterError> {
        if self.sessions.len() >= self.capacity {
            return Err(RegisterError::AtCapacity {
                capacity: self.capacity,
            });
        }
        debug!(session_id = %session.id(), peer = %session.peer(), "session registered");
        self.sessions.insert(session.id(), session);
        Ok(())
    }

    /// Add the session to the system_id index after a successful bind.
    pub fn index_bound(&self, session_id: SessionId, system_id: &str) {
        self.by_system_id
            .entry(system_id.to_string())
            .or_default()
            .push(session_id);
    }

    /// Drop a session from the table and both indexes, then fire the
    /// eviction hook exactly once.
    pub async fn unregister(&self, session_id: SessionId) {
        let Some((_, session)) = self.sessions.remove(&session_id) else {
            return;
        };

        if let Some(system_id) = session.system_id().await {
            if let Some(mut ids) = self.by_system_id.get_mut(&system_id) {
                ids.retain(|id| *id != session_id);
                let emptied = ids.is_empty();
                drop(ids);
                if emptied {
                    self.by_system_id.remove_if(&system_id, |_, ids| ids.is_empty());
                }
            }
        }

        debug!(session_id = %session_id, "session unregistered");
        if let Some(hook) = self.hook.read().await.clone() {
            hook.session_closed(&session).await;
        }
    }

    pub fn get(&self, session_id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&session_id).map(|s| s.clone())
    }

    /// All live sessions bound under the given system_id.
    pub fn sessions_for(&self, system_id: &str) -> Vec<Arc<Session>> {
        let Some(ids) = self.by_system_id.get(system_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.sessions.get(id).map(|s| s.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Ask every live session to shut down. Used during drain.
    pub fn close_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().request_close();
        }
    }

    /// Periodically close sessions idle past `idle_timeout`. Runs until
    /// the shutdown watch flips.
    pub async fn run_reaper(
        self: Arc<Self>,
        interval: Duration,
        idle_timeout: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reap_idle(idle_timeout).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("session reaper stopping");
                        return;
                    }
                }
            }
        }
    }

    async fn reap_idle(&self, idle_timeout: Duration) {
        let now = Instant::now();
        for entry in self.sessions.iter() {
            let session = entry.value();
            let idle = now.saturating_duration_since(session.idle_since().await);
            if idle >= idle_timeout && !session.is_closing() {
                warn!(
                    session_id = %session.id(),
                    idle_secs = idle.as_secs(),
                    "closing idle session"
                );
                session.request_close();
            }
        }
    }
}
