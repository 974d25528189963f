pub mod counters;
mod tracing;

pub use self::tracing::init_tracing;
