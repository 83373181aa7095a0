//! Shared primitives for all Rust crates in Portalgate.

#![forbid(unsafe_code)]

/// Credential primitives shared across crates.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::BearerToken;

/// Result type used across Portalgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend could not be reached.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// No credential, or the credential was not accepted.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid credential without access to the requested portal.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No portal descriptor matches the requested identifier.
    #[error("unknown portal '{0}'")]
    UnknownPortal(String),

    /// The backend refused an operation and returned a user-facing message.
    #[error("{0}")]
    Rejected(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
