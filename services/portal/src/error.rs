//! Custom error types for the donor portal

use common::error::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Custom error type for portal operations
#[derive(Error, Debug)]
pub enum PortalError {
    /// A form field failed local validation; nothing reached the network
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Sign-in rejected. The cause is deliberately not exposed.
    #[error("Incorrect email or password")]
    Authentication,

    /// Registration conflicts with an existing account
    #[error("This email is already registered")]
    DuplicateAccount,

    /// Operation needs a signed-in user
    #[error("User not authenticated")]
    NotAuthenticated,

    /// Transport failure talking to the gateway
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Gateway answered with an error, or with a body we cannot use
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    /// Persisted store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PortalError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PortalError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Type alias for portal results
pub type PortalResult<T> = Result<T, PortalError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field-level failure of a form, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message recorded for `field`, if any
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise the first failure as a `Validation` error
    pub fn into_result(self) -> PortalResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(FieldError { field, message }) => Err(PortalError::Validation { field, message }),
        }
    }
}
