//! Account authentication, session accounting and throughput limits.

mod manager;
mod ratelimit;
mod store;

pub use manager::{AuthError, AuthManager};
pub use ratelimit::RateLimiter;
pub use store::{AuthStore, AuthUser, MemoryAuthStore, SessionRecord, StoreError};
