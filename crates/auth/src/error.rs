use thiserror::Error;

use onboard_core::RepositoryError;

/// Authentication failure.
///
/// Callers only ever learn "unauthorized"; the reason (unknown email, wrong
/// password, inactive user, stale session) is deliberately collapsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AuthError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => AuthError::Unauthorized,
            other => AuthError::Internal(other.to_string()),
        }
    }
}
