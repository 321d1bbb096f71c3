//! Common error types for taskmint

use thiserror::Error;

/// Common result type for taskmint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the store and service layers
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found, or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unique constraint hit on a user-facing key (e.g. email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be decoded
    #[error("Internal error: {0}")]
    Internal(String),
}
