//! Counter backends for the fixed-window limiter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use refledger_core::Clock;

use crate::error::RateLimitError;

/// TTL sentinel: the key exists but carries no expiry.
pub const TTL_NONE: i64 = -1;
/// TTL sentinel: the key does not exist.
pub const TTL_MISSING: i64 = -2;

/// Expiring counter storage. Mirrors the INCR/EXPIRE/TTL triple of a
/// typical cache server, including its sentinel return values.
pub trait CounterStore: Send + Sync {
    /// Increments the counter at `key`, creating it at 1 if absent, and
    /// returns the post-increment count.
    fn incr(&self, key: &str) -> Result<u64, RateLimitError>;

    /// Sets the key's remaining lifetime.
    fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), RateLimitError>;

    /// Remaining lifetime in seconds, or [`TTL_NONE`] / [`TTL_MISSING`].
    fn ttl(&self, key: &str) -> Result<i64, RateLimitError>;
}

struct Counter {
    count: u64,
    expires_at: Option<DateTime<Utc>>,
}

/// Process-local counter store. Expired keys are reaped lazily on access.
pub struct MemoryCounterStore {
    clock: Arc<dyn Clock>,
    counters: Mutex<HashMap<String, Counter>>,
}

impl MemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn is_expired(&self, counter: &Counter) -> bool {
        matches!(counter.expires_at, Some(at) if at <= self.clock.now())
    }
}

impl CounterStore for MemoryCounterStore {
    fn incr(&self, key: &str) -> Result<u64, RateLimitError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| RateLimitError::store("counter lock poisoned"))?;
        let entry = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: None,
        });
        if self.is_expired(entry) {
            entry.count = 0;
            entry.expires_at = None;
        }
        entry.count += 1;
        Ok(entry.count)
    }

    fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), RateLimitError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| RateLimitError::store("counter lock poisoned"))?;
        if let Some(entry) = counters.get_mut(key) {
            entry.expires_at = Some(self.clock.now() + Duration::seconds(ttl_secs));
        }
        Ok(())
    }

    fn ttl(&self, key: &str) -> Result<i64, RateLimitError> {
        let counters = self
            .counters
            .lock()
            .map_err(|_| RateLimitError::store("counter lock poisoned"))?;
        let Some(entry) = counters.get(key) else {
            return Ok(TTL_MISSING);
        };
        if self.is_expired(entry) {
            return Ok(TTL_MISSING);
        }
        match entry.expires_at {
            None => Ok(TTL_NONE),
            Some(at) => Ok((at - self.clock.now()).num_seconds().max(0)),
        }
    }
}
