//! Errors raised by domain types before anything touches a store.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input rejected by field validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// The credential hasher failed to produce a hash
    #[error("Password error: {0}")]
    Password(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }
}

// Field messages are joined in validator's own format
impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::Validation(errors.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
