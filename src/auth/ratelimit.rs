//! Sliding one-second throughput windows, keyed by system_id.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
    last_used: Instant,
}

/// Per-account transactions-per-second limiter.
///
/// Each account gets a one-second window; the window resets when it
/// ages out, and a background sweep drops windows that have been idle
/// long enough that keeping them only costs memory.
#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Check and count one transaction for `system_id` against `limit`
    /// per second. Returns whether the transaction is allowed.
    pub fn check(&self, system_id: &str, limit: u32) -> bool {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(system_id.to_string())
            .or_insert(Window {
                started: now,
                count: 0,
                last_used: now,
            });

        if now.saturating_duration_since(entry.started) >= WINDOW {
            entry.started = now;
            entry.count = 0;
        }
        entry.last_used = now;

        if entry.count >= limit {
            debug!(system_id, limit, "throughput limit hit");
            return false;
        }
        entry.count += 1;
        true
    }

    /// Number of tracked accounts.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Periodically drop windows idle longer than `max_idle`.
    pub async fn run_sweeper(
        self: Arc<Self>,
        interval: Duration,
        max_idle: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    self.windows
                        .retain(|_, w| now.saturating_duration_since(w.last_used) < max_idle);
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("rate limiter sweeper stopping");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn exactly_n_calls_pass_within_one_window() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("alice", 5));
        }
        assert!(!limiter.check("alice", 5));
        assert!(!limiter.check("alice", 5));
    }

    #[tokio::test(start_paused = true)]
    async fn window_rollover_resets_the_count() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("alice", 3));
        }
        assert!(!limiter.check("alice", 3));

        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(limiter.check("alice", 3));
    }

    #[tokio::test(start_paused = true)]
    async fn accounts_are_limited_independently() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("alice", 1));
        assert!(!limiter.check("alice", 1));
        assert!(limiter.check("bob", 1));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_idle_windows() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("alice", 10));
        assert_eq!(limiter.tracked(), 1);

        let (tx, rx) = watch::channel(false);
        let sweeper = tokio::spawn(limiter.clone().run_sweeper(
            Duration::from_millis(100),
            Duration::from_millis(300),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(limiter.tracked(), 0);

        tx.send(true).unwrap();
        sweeper.await.unwrap();
    }
}
