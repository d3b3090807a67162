//! Fixed-window admission limiter with lazy TTL repair.

mod counter;
mod error;
mod limiter;

pub use counter::{CounterStore, MemoryCounterStore, TTL_MISSING, TTL_NONE};
pub use error::RateLimitError;
pub use limiter::RateLimiter;
