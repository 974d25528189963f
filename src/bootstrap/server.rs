use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, span, warn, Instrument, Level};

use crate::auth::{AuthManager, MemoryAuthStore, RateLimiter};
use crate::bridge::{AmqpBridge, NullPublisher, ReportRouter, SubmitPublisher};
use crate::config::Config;
use crate::handler::Dispatcher;
use crate::session::{
    EvictionHook, RegisterError, RunnerConfig, Session, SessionManager, SessionRunner,
};
use crate::telemetry::counters;

use super::shutdown::Shutdown;

/// Outbound frames buffered per session before senders are refused.
const OUTBOUND_QUEUE: usize = 128;

/// How long drain waits for sessions to finish closing.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Releases the account layer's session slot when a session leaves the
/// registry, whatever killed it.
struct AuthEvictionHook {
    auth: Arc<AuthManager>,
}

#[async_trait]
impl EvictionHook for AuthEvictionHook {
    async fn session_closed(&self, session: &Session) {
        if let Err(err) = self.auth.remove_session(&session.id().to_string()).await {
            error!(session_id = %session.id(), error = %err, "failed to release session record");
        }
    }
}

/// The assembled server: all services constructed up front and passed
/// by reference, no ambient globals.
pub struct Server {
    config: Arc<Config>,
    shutdown: Arc<Shutdown>,
    auth: Arc<AuthManager>,
    sessions: Arc<SessionManager>,
    dispatcher: Arc<Dispatcher>,
    bridge: Option<Arc<AmqpBridge>>,
}

impl Server {
    /// Build every service and connect to the broker when one is
    /// configured.
    pub async fn new(config: Config, shutdown: Arc<Shutdown>) -> Result<Self> {
        let config = Arc::new(config);

        let store = Arc::new(MemoryAuthStore::new(config.users.clone()));
        let limiter = RateLimiter::new();
        let auth = AuthManager::new(store, limiter);

        let sessions = SessionManager::new(config.server.max_sessions);
        sessions
            .set_eviction_hook(Arc::new(AuthEvictionHook { auth: auth.clone() }))
            .await;

        let (publisher, bridge): (Arc<dyn SubmitPublisher>, Option<Arc<AmqpBridge>>) =
            match &config.broker {
                Some(broker_config) => {
                    let bridge = Arc::new(
                        AmqpBridge::connect(broker_config)
                            .await
                            .context("broker connection failed")?,
                    );
                    (bridge.clone(), Some(bridge))
                }
                None => {
                    warn!("no broker configured, submits will be accepted and dropped");
                    (Arc::new(NullPublisher), None)
                }
            };

        let dispatcher = Dispatcher::new(auth.clone(), sessions.clone(), publisher);

        Ok(Self {
            config,
            shutdown,
            auth,
            sessions,
            dispatcher,
            bridge,
        })
    }

    /// Run until the shutdown flag flips, then drain.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.server.address)
            .await
            .with_context(|| format!("failed to bind {}", self.config.server.address))?;

        info!(
            address = %self.config.server.address,
            max_sessions = self.config.server.max_sessions,
            users = self.config.users.len(),
            broker = self.bridge.is_some(),
            "smppgw listening"
        );

        self.spawn_background_tasks();

        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if self.shutdown.is_triggered() {
                        info!("accept loop stopping");
                        break;
                    }
                }

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.handle_accept(stream, peer),
                        Err(err) => {
                            error!(error = %err, "accept error");
                        }
                    }
                }
            }
        }

        self.drain().await;
        info!("smppgw stopped");
        Ok(())
    }

    fn handle_accept(&self, stream: tokio::net::TcpStream, peer: std::net::SocketAddr) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let session = Session::new(peer, outbound_tx);

        if let Err(RegisterError::AtCapacity { capacity }) = self.sessions.register(session.clone())
        {
            warn!(peer = %peer, capacity, "session table full, rejecting connection");
            counters::connection_rejected("capacity");
            return;
        }

        counters::connection_accepted();
        counters::sessions_active(self.sessions.count());

        let runner_config = RunnerConfig {
            read_timeout: self.config.server.read_timeout,
            write_timeout: self.config.server.write_timeout,
            enquire_link_interval: self.config.server.enquire_link_interval,
            link_dead_timeout: self.config.server.link_dead_timeout,
        };
        let runner = SessionRunner::new(
            session.clone(),
            stream,
            outbound_rx,
            self.dispatcher.clone(),
            runner_config,
        );

        let sessions = self.sessions.clone();
        let span = span!(Level::INFO, "conn", session_id = %session.id(), peer = %peer);
        tokio::spawn(
            async move {
                if let Err(err) = runner.run().await {
                    warn!(error = %err, "session ended with error");
                }
                sessions.unregister(session.id()).await;
                counters::sessions_active(sessions.count());
            }
            .instrument(span),
        );
    }

    fn spawn_background_tasks(&self) {
        tokio::spawn(self.sessions.clone().run_reaper(
            self.config.server.reaper_interval,
            self.config.server.session_timeout,
            self.shutdown.subscribe(),
        ));

        tokio::spawn(self.auth.limiter().run_sweeper(
            self.config.server.rate_limit_sweep_interval,
            self.config.server.rate_limit_idle,
            self.shutdown.subscribe(),
        ));

        tokio::spawn(self.auth.clone().run_session_expiry(
            self.config.server.reaper_interval,
            self.config.server.session_record_max_age,
            self.shutdown.subscribe(),
        ));

        if let Some(bridge) = &self.bridge {
            let router = ReportRouter::new(self.sessions.clone());
            let consumer = bridge.clone().run_report_consumer(router, self.shutdown.subscribe());
            tokio::spawn(async move {
                if let Err(err) = consumer.await {
                    error!(error = %err, "delivery report consumer failed");
                }
            });
        }
    }

    /// Ask every session to close and wait for the table to empty, up
    /// to the drain timeout.
    async fn drain(&self) {
        let open = self.sessions.count();
        if open == 0 {
            return;
        }
        info!(sessions = open, "draining sessions");
        self.sessions.close_all();

        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        while self.sessions.count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let remaining = self.sessions.count();
        if remaining > 0 {
            warn!(sessions = remaining, "drain timeout reached with sessions still open");
        }
    }
}
