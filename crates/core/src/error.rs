//! Domain error model.

use thiserror::Error;

/// Rejected input, raised before any state is touched.
///
/// Lifecycle conflicts are not input errors; they live next to the state
/// machines that raise them (`ReceptionError`, `LedgerError`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier did not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
