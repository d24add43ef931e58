//! Error taxonomy for explorer queries.

/// Error type for explorer operations.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("request timed out")]
    Timeout,
    #[error("no data found for address {0}")]
    NotFound(String),
    #[error("explorer rate limit reached")]
    RateLimited,
    #[error("explorer rejected the session: {0}")]
    SessionRejected(String),
    #[error("unexpected response shape: {0}")]
    Malformed(String),
    #[error("explorer returned HTTP status {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ExplorerError {
    /// Whether this failure leaves the session unusable for the rest of the
    /// run. Fatal errors abort the enrichment loop; everything else is
    /// recorded as a missing metric and the loop moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExplorerError::SessionRejected(_))
    }
}

/// Result type for explorer operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;
