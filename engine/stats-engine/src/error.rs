//! Error types for StatsEngine

use thiserror::Error;

/// Result type for StatsEngine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while configuring or querying the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid slot schema: {0}")]
    InvalidSlotSchema(String),

    #[error("Unknown ranking category: {0}")]
    UnknownCategory(String),
}

impl EngineError {
    /// Create a new slot schema error
    pub fn invalid_slot_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSlotSchema(msg.into())
    }
}
