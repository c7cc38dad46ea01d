use thiserror::Error;

use pvz_auth::{CredentialsError, PasswordError};
use pvz_core::DomainError;
use pvz_products::LedgerError;
use pvz_receptions::ReceptionError;

use crate::store::{Retryable, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("email {0} is already registered")]
    EmailTaken(String),

    #[error("no user with email {0}")]
    UnknownEmail(String),

    #[error("wrong password")]
    WrongPassword,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("token issuance failed: {0}")]
    Token(String),
}

/// Error returned by every application service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected input; raised before any transaction starts.
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Reception(#[from] ReceptionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CredentialsError> for ServiceError {
    fn from(err: CredentialsError) -> Self {
        ServiceError::Auth(AuthError::Credentials(err))
    }
}

impl Retryable for ServiceError {
    fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Store(e) if e.is_retryable())
    }
}
