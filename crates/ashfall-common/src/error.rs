//! Error types shared across Ashfall crates.

use thiserror::Error;

/// Top-level error type for Ashfall operations.
#[derive(Debug, Error)]
pub enum AshfallError {
    /// A content set failed validation
    #[error("Content error: {0}")]
    Content(String),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Ashfall operations.
pub type AshfallResult<T> = Result<T, AshfallError>;
