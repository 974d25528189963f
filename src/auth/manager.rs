//! Bind authentication and per-account session accounting.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::protocol::Status;

use super::ratelimit::RateLimiter;
use super::store::{AuthStore, AuthUser, SessionRecord, StoreError};

/// Throughput applied when an account's TPS string does not parse.
const DEFAULT_TPS: u32 = 100;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown system_id")]
    UnknownSystemId,

    #[error("invalid password")]
    InvalidPassword,

    #[error("account disabled")]
    Inactive,

    #[error("session limit reached ({limit})")]
    TooManySessions { limit: u32 },

    #[error("throughput limit exceeded")]
    Throttled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// SMPP status a handler should put in the response.
    pub fn status(&self) -> Status {
        match self {
            // Unknown accounts answer exactly like bad credentials so
            // a client cannot enumerate which system_ids exist.
            AuthError::UnknownSystemId | AuthError::InvalidPassword | AuthError::Inactive => {
                Status::InvalidPassword
            }
            AuthError::TooManySessions { .. } => Status::AlreadyBound,
            AuthError::Throttled => Status::Throttled,
            AuthError::Store(_) => Status::SystemError,
        }
    }
}

/// Front door for everything account-shaped: credential checks, the
/// concurrent-session ceiling, lifetime counters and the TPS limiter.
pub struct AuthManager {
    store: Arc<dyn AuthStore>,
    limiter: Arc<RateLimiter>,
}

impl AuthManager {
    pub fn new(store: Arc<dyn AuthStore>, limiter: Arc<RateLimiter>) -> Arc<Self> {
        Arc::new(Self { store, limiter })
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    /// Exact credential match against active accounts only.
    pub async fn authenticate(&self, system_id: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self
            .store
            .find_user(system_id)
            .await?
            .ok_or(AuthError::UnknownSystemId)?;
        if !user.active {
            warn!(system_id, "bind from disabled account");
            return Err(AuthError::Inactive);
        }
        if user.password != password {
            return Err(AuthError::InvalidPassword);
        }
        Ok(user)
    }

    /// Persist the new session record, subject to the account's
    /// concurrent-session ceiling. The store enforces the ceiling
    /// atomically, so racing binds cannot overshoot it.
    pub async fn add_session(&self, user: &AuthUser, record: SessionRecord) -> Result<(), AuthError> {
        if !self.store.add_session(record, user.max_sessions).await? {
            info!(
                system_id = %user.system_id,
                limit = user.max_sessions,
                "session limit reached"
            );
            return Err(AuthError::TooManySessions {
                limit: user.max_sessions,
            });
        }
        Ok(())
    }

    pub async fn remove_session(&self, key: &str) -> Result<(), AuthError> {
        self.store.remove_session(key).await?;
        Ok(())
    }

    pub async fn increment_message_count(&self, system_id: &str, sent: bool) {
        if let Err(err) = self.store.increment_message_count(system_id, sent).await {
            // Counters are bookkeeping; never fail traffic over them.
            error!(system_id, error = %err, "failed to update message counters");
        }
    }

    /// Check one transaction against the account's configured SMPP TPS.
    pub async fn check_rate_limit(&self, system_id: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_user(system_id)
            .await?
            .ok_or(AuthError::UnknownSystemId)?;
        let limit = parse_tps(&user.smpp_tps);
        if self.limiter.check(system_id, limit) {
            Ok(())
        } else {
            Err(AuthError::Throttled)
        }
    }

    /// Periodically drop stale session rows from the store.
    pub async fn run_session_expiry(
        self: Arc<Self>,
        interval: Duration,
        max_age: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::hours(1));
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.store.expire_sessions(max_age).await {
                        Ok(0) => {}
                        Ok(count) => debug!(count, "expired stale session records"),
                        Err(err) => error!(error = %err, "session expiry sweep failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("session expiry sweep stopping");
                        return;
                    }
                }
            }
        }
    }
}

fn parse_tps(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(DEFAULT_TPS)
}
