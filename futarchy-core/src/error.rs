//! Error types for the chart engine

use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status or an `errors` payload from an upstream service
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Rate limited by {0}")]
    RateLimited(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChartError {
    pub fn network(msg: impl Into<String>) -> Self {
        ChartError::Network(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        ChartError::Upstream(msg.into())
    }

    pub fn rate_limited(provider: impl Into<String>) -> Self {
        ChartError::RateLimited(provider.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        ChartError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ChartError::NotFound(msg.into())
    }

    pub fn invalid_ticker(msg: impl Into<String>) -> Self {
        ChartError::InvalidTicker(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ChartError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ChartError::Internal(msg.into())
    }

    /// Failures worth retrying on the next request. Results of a transient
    /// failure must never be cached.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChartError::Network(_) | ChartError::Upstream(_) | ChartError::RateLimited(_)
        )
    }
}

/// Result type alias for chart operations
pub type ChartResult<T> = Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ChartError::network("reset").is_transient());
        assert!(ChartError::upstream("502").is_transient());
        assert!(ChartError::rate_limited("geckoterminal").is_transient());
        assert!(!ChartError::not_found("pool").is_transient());
        assert!(!ChartError::invalid_ticker("x").is_transient());
    }

    #[test]
    fn test_display() {
        let err = ChartError::rate_limited("geckoterminal");
        assert_eq!(err.to_string(), "Rate limited by geckoterminal");
    }
}
