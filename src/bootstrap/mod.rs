//! Process wiring: service construction, the accept loop and shutdown.

mod server;
mod shutdown;

pub use server::Server;
pub use shutdown::{wait_for_signal, Shutdown};
