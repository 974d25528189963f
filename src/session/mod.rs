//! Client session lifecycle: per-connection state, the shared session
//! table, and the connection-driving task.

mod manager;
mod runner;
#[allow(clippy::module_inception)]
mod session;

pub use manager::{EvictionHook, RegisterError, SessionManager};
pub use runner::{RunnerConfig, SessionRunner};
pub use session::{BindState, Session, SessionError, SessionId};
