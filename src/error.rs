//! Error types for the ranking engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Callers that need to branch on a specific failure
//! recover it with `downcast_ref::<RankerError>()`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ranking scenarios
#[derive(Debug, thiserror::Error)]
pub enum RankerError {
    #[error("Corrupt snapshot {path}: {reason}")]
    CorruptSnapshot { path: String, reason: String },

    #[error("Failed to persist snapshot {path}: {message}")]
    PersistenceError { path: String, message: String },

    #[error("Invalid match: {reason}")]
    InvalidMatch { reason: String },

    #[error("Need at least 2 entities to rank, found {found}")]
    InsufficientEntities { found: usize },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Import failed: {reason}")]
    ImportFailed { reason: String },
}

impl RankerError {
    /// Whether the failure only affects durability and the session may go on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RankerError::PersistenceError { .. })
    }
}

/// Extract the typed ranking error from an anyhow chain, if there is one
pub fn ranker_error(err: &anyhow::Error) -> Option<&RankerError> {
    err.downcast_ref::<RankerError>()
}
