//! Request-scoped error taxonomy shared by the domain services and the API.
//!
//! None of these variants is fatal to the process: validation, conflict and
//! authorization failures are returned to the caller, missing records surface
//! as absence, and only `Internal` is logged as a server fault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Empty required field, missing moderation note, invalid transition.
    #[error("{0}")]
    Validation(String),
    /// Duplicate unique key (slug, email).
    #[error("{0}")]
    Conflict(String),
    /// No authenticated viewer for an action that needs one.
    #[error("Login required")]
    Unauthorized,
    /// Unknown email or wrong password; the two are not distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Authenticated viewer lacks the capability.
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
