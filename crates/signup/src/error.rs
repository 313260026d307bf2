use thiserror::Error;

use onboard_auth::PasswordHashError;
use onboard_core::{DomainError, RepositoryError};

/// Signup workflow failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignupError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Unexpected persistence failure. Detail is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for SignupError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(_) => {
                SignupError::Domain(DomainError::conflict("email already registered"))
            }
            other => SignupError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordHashError> for SignupError {
    fn from(value: PasswordHashError) -> Self {
        SignupError::Internal(value.to_string())
    }
}
