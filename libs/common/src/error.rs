//! Custom error types for the common library
//!
//! This module defines the error type shared by every persisted key-value
//! store backend.

use thiserror::Error;

/// Custom error type for key-value store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error reading or writing the backing file
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file holds something other than a string map
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error talking to Redis
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
