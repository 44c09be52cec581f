//! Error types for the league stats service

use mfl_fetcher::UpstreamError;
use stats_engine::EngineError;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Fresh computation failed and nothing usable was cached
    #[error("Data unavailable for {key}: {reason}{}", near_miss(.cached_age_ms))]
    Unavailable { key: String, reason: String, cached_age_ms: Option<i64> },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn near_miss(age_ms: &Option<i64>) -> String {
    match age_ms {
        Some(ms) => format!(" (closest cached data is {}s old)", ms / 1000),
        None => String::new(),
    }
}

impl StatsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
