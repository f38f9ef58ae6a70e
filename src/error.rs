// src/error.rs
// Standardized error types for Engram

use thiserror::Error;

/// Main error type for the Engram library
#[derive(Error, Debug)]
pub enum EngramError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("schema conflict for collection '{collection}': {detail}")]
    SchemaConflict { collection: String, detail: String },

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Result using EngramError
pub type Result<T> = std::result::Result<T, EngramError>;

impl EngramError {
    pub fn schema_conflict(collection: impl Into<String>, detail: impl Into<String>) -> Self {
        EngramError::SchemaConflict {
            collection: collection.into(),
            detail: detail.into(),
        }
    }

    /// Convert to user-facing string for MCP tool boundaries
    pub fn to_user_string(&self) -> String {
        self.to_string()
    }
}

impl From<EngramError> for String {
    fn from(err: EngramError) -> Self {
        err.to_string()
    }
}
