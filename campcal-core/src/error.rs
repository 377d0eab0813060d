//! Error types for the campcal engine.

use thiserror::Error;

/// Errors that can occur in campcal operations.
#[derive(Error, Debug)]
pub enum CampcalError {
    /// Malformed or missing event fields, caught before any store call.
    #[error("Invalid event: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    /// Connectivity or permission failure reported by the event store.
    #[error("Store error: {0}")]
    Store(String),

    #[error("Not signed in: a current user is required for this operation")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CampcalError {
    /// Read-side failures that degrade to an empty result set instead of
    /// putting the view into its error state.
    pub fn is_degradable(&self) -> bool {
        matches!(self, CampcalError::Store(_) | CampcalError::Io(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CampcalError::NotFound(_))
    }
}

/// Result type alias for campcal operations.
pub type CampcalResult<T> = Result<T, CampcalError>;
