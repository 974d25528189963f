//! Account and session-record storage.
//!
//! The server consumes this store, it does not own it: the trait is the
//! narrow query contract a relational backend would satisfy, and
//! [`MemoryAuthStore`] is the in-process implementation used by the
//! standalone server and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Account record keyed by unique `system_id`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthUser {
    pub system_id: String,
    pub password: String,
    /// Concurrent-session ceiling for this account.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Per-account MT throughput, transactions per second, as free-form
    /// strings. Unparsable values fall back to a default at check time.
    #[serde(default)]
    pub smpp_tps: String,
    #[serde(default)]
    pub http_tps: String,
    #[serde(skip)]
    pub online: bool,
    #[serde(skip)]
    pub last_ip: Option<String>,
    #[serde(skip)]
    pub online_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub offline_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub connection_count: u64,
    #[serde(skip)]
    pub messages_sent: u64,
    #[serde(skip)]
    pub messages_received: u64,
}

fn default_max_sessions() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

/// One live bind, as the store sees it.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Store key; the server uses the session id's display form.
    pub key: String,
    pub system_id: String,
    pub remote_addr: String,
    pub bind_type: String,
    pub bound_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("auth store unavailable: {0}")]
    Unavailable(String),
}

/// Query contract against the account backing store.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user(&self, system_id: &str) -> Result<Option<AuthUser>, StoreError>;

    async fn session_count(&self, system_id: &str) -> Result<usize, StoreError>;

    /// Persist a new session unless the account already holds `limit`
    /// live sessions. The count and the insert happen in one
    /// storage-side step, so concurrent binds cannot both slip under
    /// the ceiling. Returns whether the session was inserted. On
    /// insert, bumps the account's connection counter, stamps the last
    /// IP and marks the account online.
    async fn add_session(&self, record: SessionRecord, limit: u32) -> Result<bool, StoreError>;

    /// Delete a session record. Dropping the account's last session
    /// marks it offline and stamps the disconnect time.
    async fn remove_session(&self, key: &str) -> Result<(), StoreError>;

    async fn increment_message_count(&self, system_id: &str, sent: bool) -> Result<(), StoreError>;

    /// Drop session rows older than `max_age`. Returns how many went.
    async fn expire_sessions(&self, max_age: Duration) -> Result<usize, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, AuthUser>,
    sessions: HashMap<String, SessionRecord>,
}

/// In-memory [`AuthStore`].
#[derive(Default)]
pub struct MemoryAuthStore {
    state: RwLock<MemoryState>,
}

impl MemoryAuthStore {
    pub fn new(users: impl IntoIterator<Item = AuthUser>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.system_id.clone(), u))
            .collect();
        Self {
            state: RwLock::new(MemoryState {
                users,
                sessions: HashMap::new(),
            }),
        }
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn find_user(&self, system_id: &str) -> Result<Option<AuthUser>, StoreError> {
        Ok(self.state.read().await.users.get(system_id).cloned())
    }

    async fn session_count(&self, system_id: &str) -> Result<usize, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .values()
            .filter(|s| s.system_id == system_id)
            .count())
    }

    async fn add_session(&self, record: SessionRecord, limit: u32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let active = state
            .sessions
            .values()
            .filter(|s| s.system_id == record.system_id)
            .count();
        if active >= limit as usize {
            return Ok(false);
        }
        if let Some(user) = state.users.get_mut(&record.system_id) {
            user.connection_count += 1;
            user.last_ip = Some(record.remote_addr.clone());
            user.online = true;
            user.online_at = Some(record.bound_at);
        }
        state.sessions.insert(record.key.clone(), record);
        Ok(true)
    }

    async fn remove_session(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let Some(record) = state.sessions.remove(key) else {
            return Ok(());
        };
        let remaining = state
            .sessions
            .values()
            .any(|s| s.system_id == record.system_id);
        if !remaining {
            if let Some(user) = state.users.get_mut(&record.system_id) {
                user.online = false;
                user.offline_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn increment_message_count(&self, system_id: &str, sent: bool) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(system_id) {
            if sent {
                user.messages_sent += 1;
            } else {
                user.messages_received += 1;
            }
        }
        Ok(())
    }

    async fn expire_sessions(&self, max_age: Duration) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - max_age;
        let mut state = self.state.write().await;
        let stale: Vec<String> = state
            .sessions
            .iter()
            .filter(|(_, s)| s.bound_at < cutoff)
            .map(|(k, _)| k.clone())
            .collect();
        let count = stale.len();
        for key in stale {
            if let Some(record) = state.sessions.remove(&key) {
                debug!(key = %key, system_id = %record.system_id, "expired stale session record");
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) fn test_user(system_id: &str, password: &str) -> AuthUser {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, system_id: &str) -> SessionRecord {
        SessionRecord {
            key: key.into(),
            system_id: system_id.into(),
            remote_addr: "10.0.0.1:40000".into(),
            bind_type: "transceiver".into(),
            bound_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_session_marks_user_online() {
        let store = MemoryAuthStore::new([test_user("alice", "secret")]);
        store.add_session(record("s1", "alice"), 5).await.unwrap();

        let user = store.find_user("alice").await.unwrap().unwrap();
        assert!(user.online);
        assert_eq!(user.connection_count, 1);
        assert_eq!(user.last_ip.as_deref(), Some("10.0.0.1:40000"));
        assert_eq!(store.session_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn add_session_refuses_past_the_ceiling() {
        let store = MemoryAuthStore::new([test_user("alice", "secret")]);
        assert!(store.add_session(record("s1", "alice"), 1).await.unwrap());
        assert!(!store.add_session(record("s2", "alice"), 1).await.unwrap());
        assert_eq!(store.session_count("alice").await.unwrap(), 1);

        // A refused insert leaves the account bookkeeping untouched.
        let user = store.find_user("alice").await.unwrap().unwrap();
        assert_eq!(user.connection_count, 1);
    }

    #[tokio::test]
    async fn concurrent_adds_cannot_both_slip_under_the_ceiling() {
        let store = MemoryAuthStore::new([test_user("alice", "secret")]);
        let (a, b) = tokio::join!(
            store.add_session(record("s1", "alice"), 1),
            store.add_session(record("s2", "alice"), 1)
        );
        assert_eq!(u32::from(a.unwrap()) + u32::from(b.unwrap()), 1);
        assert_eq!(store.session_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn removing_last_session_marks_user_offline() {
        let store = MemoryAuthStore::new([test_user("alice", "secret")]);
        store.add_session(record("s1", "alice"), 5).await.unwrap();
        store.add_session(record("s2", "alice"), 5).await.unwrap();

        store.remove_session("s1").await.unwrap();
        assert!(store.find_user("alice").await.unwrap().unwrap().online);

        store.remove_session("s2").await.unwrap();
        let user = store.find_user("alice").await.unwrap().unwrap();
        assert!(!user.online);
        assert!(user.offline_at.is_some());
    }

    #[tokio::test]
    async fn message_counters_accumulate() {
        let store = MemoryAuthStore::new([test_user("alice", "secret")]);
        store.increment_message_count("alice", true).await.unwrap();
        store.increment_message_count("alice", true).await.unwrap();
        store.increment_message_count("alice", false).await.unwrap();

        let user = store.find_user("alice").await.unwrap().unwrap();
        assert_eq!(user.messages_sent, 2);
        assert_eq!(user.messages_received, 1);
    }

    #[tokio::test]
    async fn expire_sessions_drops_old_records_only() {
        let store = MemoryAuthStore::new([test_user("alice", "secret")]);
        let mut old = record("old", "alice");
        old.bound_at = Utc::now() - Duration::hours(2);
        store.add_session(old, 5).await.unwrap();
        store.add_session(record("fresh", "alice"), 5).await.unwrap();

        let expired = store.expire_sessions(Duration::hours(1)).await.unwrap();
        assert_eq!(expired, 1);
        assert_eq!(store.session_count("alice").await.unwrap(), 1);
    }
}
