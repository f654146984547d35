//! Error types for Attune Core
//!
//! This module defines all error types used throughout the engine.
//! We use `thiserror` for ergonomic error definitions with automatic
//! Display/Error implementations.
//!
//! Error kinds carry stable messages: the API layer maps each kind to a
//! transport-level failure code, so the mapping must be deterministic.

use thiserror::Error;

/// Result type alias for Attune operations
pub type Result<T> = std::result::Result<T, AttuneError>;

/// Main error type for Attune operations
#[derive(Error, Debug)]
pub enum AttuneError {
    /// Unknown user id on a read
    #[error("user not found: {0}")]
    NotFound(String),

    /// A single memory payload exceeds the whole per-user byte budget.
    /// The entry is dropped, never partially stored.
    #[error("memory payload of {size} bytes exceeds the per-user budget of {budget} bytes")]
    EntryTooLarge { size: usize, budget: usize },

    /// The durable layer is unreachable. Short-term memory is unaffected,
    /// so the conversation can continue degraded.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A caller-imposed deadline was exceeded before any mutation happened
    #[error("operation deadline exceeded")]
    Timeout,

    /// A supplied preference or feedback value is outside its valid range
    #[error("invalid preference for {axis}: {value} is outside [{min}, {max}]")]
    InvalidPreference {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Configuration file errors
    #[error("config error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<AttuneError>,
    },
}

impl AttuneError {
    /// Build an `InvalidPreference` for a value outside `[0, 1]`
    pub fn invalid_axis(axis: &'static str, value: f64) -> Self {
        Self::InvalidPreference {
            axis,
            value,
            min: 0.0,
            max: 1.0,
        }
    }

    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<rusqlite::Error> for AttuneError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = AttuneError::NotFound("alice".to_string());
        let err = err.context("failed to fetch profile");

        assert!(err.to_string().contains("failed to fetch profile"));
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(AttuneError::Timeout);
        let result = result.context("chat turn aborted");

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("chat turn aborted"));
    }

    #[test]
    fn test_invalid_axis_message_is_stable() {
        let err = AttuneError::invalid_axis("formality", 1.5);
        assert_eq!(
            err.to_string(),
            "invalid preference for formality: 1.5 is outside [0, 1]"
        );
    }
}
