//! Error types for forum storage operations.

use thiserror::Error;

/// Result type alias for forum storage operations.
pub type Result<T> = std::result::Result<T, ForumError>;

/// Main error type for forum storage operations.
#[derive(Error, Debug)]
pub enum ForumError {
    /// The id has no content record (absent or purged).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation's precondition does not hold (e.g. a parent board with children).
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A uniqueness constraint would be broken (e.g. a legacy id mapped twice).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Underlying key-value store failure, passed through unmodified.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForumError {
    /// Creates a new not-found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Creates a new precondition-failed error.
    pub fn precondition<T: ToString>(msg: T) -> Self {
        Self::PreconditionFailed(msg.to_string())
    }

    /// Creates a new constraint-violation error.
    pub fn constraint<T: ToString>(msg: T) -> Self {
        Self::ConstraintViolation(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new invalid input error.
    pub fn invalid_input<T: ToString>(msg: T) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    /// Returns true if this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a `PreconditionFailed` error.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed(_))
    }
}
