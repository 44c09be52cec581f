//! Error types for upstream league data access

use thiserror::Error;

/// Result type for upstream operations
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Failures talking to the upstream league data provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Transport failure or non-2xx response
    #[error("Upstream unavailable: {message}")]
    Unavailable { message: String },

    /// The provider asked us to slow down
    #[error("Upstream rate limited: {message}")]
    RateLimited { message: String },

    /// The provider answered but returned nothing usable
    #[error("No data: {message}")]
    NoData { message: String },

    /// The response body could not be decoded
    #[error("Malformed upstream response: {message}")]
    Malformed { message: String },
}

impl UpstreamError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited { message: message.into() }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            return Self::rate_limited(err.to_string());
        }
        if err.is_decode() {
            return Self::malformed(err.to_string());
        }
        Self::unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
