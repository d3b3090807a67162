//! Best-effort fixed-window limiter over a [`CounterStore`].

use std::sync::Arc;

use crate::counter::{CounterStore, TTL_NONE};
use crate::error::RateLimitError;

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Counts one request against `key` and reports whether it fits within
    /// `limit` per `window_secs`.
    pub fn allow(&self, key: &str, limit: u64, window_secs: i64) -> Result<bool, RateLimitError> {
        let count = self.count(key, window_secs)?;
        if count > limit {
            tracing::warn!(key = %key, count, limit, "rate limit exceeded");
            return Ok(false);
        }
        Ok(true)
    }

    /// [`allow`](Self::allow) as a guard: over-limit calls become a typed
    /// error, carrying the window's running count, for callers that gate
    /// admission with `?`.
    pub fn check(&self, key: &str, limit: u64, window_secs: i64) -> Result<(), RateLimitError> {
        let count = self.count(key, window_secs)?;
        if count <= limit {
            return Ok(());
        }
        Err(RateLimitError::Exceeded {
            key: key.to_string(),
            count,
            limit,
            window_secs,
        })
    }

    /// Increments the key and returns the window's running count. The first
    /// increment of a window starts the expiry; a counter found without one
    /// (an increment that raced the expiry call, or a store that dropped it)
    /// gets the expiry re-applied so the key cannot count forever.
    fn count(&self, key: &str, window_secs: i64) -> Result<u64, RateLimitError> {
        let count = self.store.incr(key)?;
        if count == 1 || self.store.ttl(key)? == TTL_NONE {
            self.store.expire(key, window_secs)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::MemoryCounterStore;
    use chrono::{Duration, TimeZone, Utc};
    use refledger_core::FixedClock;

    fn limiter() -> (Arc<FixedClock>, RateLimiter) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryCounterStore::new(clock.clone()));
        (clock, RateLimiter::new(store))
    }

    #[test]
    fn test_sixth_call_is_denied() {
        let (_, limiter) = limiter();
        for _ in 0..5 {
            assert!(limiter.allow("login:MBR-A", 5, 60).unwrap());
        }
        assert!(!limiter.allow("login:MBR-A", 5, 60).unwrap());
    }

    #[test]
    fn test_window_elapse_resets_the_counter() {
        let (clock, limiter) = limiter();
        for _ in 0..6 {
            limiter.allow("login:MBR-A", 5, 60).unwrap();
        }
        assert!(!limiter.allow("login:MBR-A", 5, 60).unwrap());

        clock.advance(Duration::seconds(61));
        assert!(limiter.allow("login:MBR-A", 5, 60).unwrap());
    }

    #[test]
    fn test_keys_are_independent() {
        let (_, limiter) = limiter();
        for _ in 0..5 {
            limiter.allow("login:MBR-A", 5, 60).unwrap();
        }
        assert!(!limiter.allow("login:MBR-A", 5, 60).unwrap());
        assert!(limiter.allow("login:MBR-B", 5, 60).unwrap());
    }

    #[test]
    fn test_check_surfaces_a_typed_error() {
        let (_, limiter) = limiter();
        for _ in 0..5 {
            limiter.check("login:MBR-A", 5, 60).unwrap();
        }
        let err = limiter.check("login:MBR-A", 5, 60).unwrap_err();
        assert!(matches!(
            err,
            RateLimitError::Exceeded {
                count: 6,
                limit: 5,
                ..
            }
        ));
    }
}
