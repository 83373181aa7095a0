use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Opaque bearer credential issued by the auth backend.
///
/// The value is never printed through `Debug`; use [`BearerToken::expose`]
/// when building the `Authorization` header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a token from a raw value, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "bearer token must not be empty".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for BearerToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("BearerToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::BearerToken;

    #[test]
    fn token_is_trimmed_and_redacted() {
        let token = BearerToken::new("  abc123 \n");
        assert!(token.is_ok());

        let Ok(token) = token else {
            panic!("token should parse");
        };
        assert_eq!(token.expose(), "abc123");
        assert_eq!(token.authorization_header(), "Bearer abc123");
        assert_eq!(format!("{token:?}"), "BearerToken(<redacted>)");
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(BearerToken::new("   ").is_err());
    }

    #[test]
    fn token_serializes_as_plain_string() {
        let token = BearerToken::new("abc").unwrap_or_else(|_| panic!("valid token"));
        let json = serde_json::to_string(&token).unwrap_or_default();
        assert_eq!(json, "\"abc\"");
    }
}
