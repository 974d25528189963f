//! smppgw: a standalone SMPP 3.4 server.
//!
//! Terminates TCP connections from ESMEs, authenticates and rate-limits
//! them, keeps a per-connection bind-state machine, and bridges accepted
//! messages to an AMQP broker while routing broker-originated delivery
//! reports back to the owning live sessions.

pub mod auth;
pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod handler;
pub mod protocol;
pub mod session;
pub mod telemetry;
