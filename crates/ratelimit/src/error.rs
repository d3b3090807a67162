use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded for {key}: {count} requests in a {window_secs}s window (limit {limit})")]
    Exceeded {
        key: String,
        count: u64,
        limit: u64,
        window_secs: i64,
    },

    #[error("Counter store failure: {0}")]
    Store(String),
}

impl RateLimitError {
    pub fn store(message: impl Into<String>) -> Self {
        RateLimitError::Store(message.into())
    }
}
