//! Unified application error types for Galaxy.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] carries the
//! caller-facing taxonomy; the message and source carry internal detail
//! that is logged but never shown to callers for server-side kinds.

use std::fmt;
use thiserror::Error;

/// Error categories used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input validation failed.
    Validation,
    /// A new password does not satisfy the password policy.
    WeakPassword,
    /// Email/password combination rejected. Used for unknown emails too.
    InvalidCredentials,
    /// No bearer or refresh token was presented.
    MissingToken,
    /// Token is malformed, has a bad signature, or the wrong type.
    InvalidToken,
    /// Token header names an algorithm other than the accepted one.
    InvalidAlgorithm,
    /// Token is past its expiry or the session exceeded its maximum lifetime.
    TokenExpired,
    /// Access token was blacklisted before its natural expiry.
    TokenRevoked,
    /// Refresh token has no persisted row or the row is revoked.
    RefreshTokenInvalid,
    /// Too many failed login attempts.
    AccountLocked,
    /// A conflict occurred (duplicate email, concurrent modification).
    Conflict,
    /// The requested resource was not found.
    NotFound,
    /// A configuration error occurred.
    Configuration,
    /// A database error occurred.
    Database,
    /// A cache error occurred.
    Cache,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An external command failed validation or execution.
    Execution,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code returned to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingToken => "NO_AUTH_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidAlgorithm => "INVALID_ALGORITHM",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::RefreshTokenInvalid => "INVALID_REFRESH_TOKEN",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Database | Self::Cache | Self::Serialization | Self::Internal => {
                "INTERNAL_ERROR"
            }
            Self::Execution => "EXECUTION_ERROR",
        }
    }

    /// Whether the detail of this error must stay server-side.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Configuration | Self::Database | Self::Cache | Self::Serialization | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout Galaxy.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Structured detail returned to callers alongside the message.
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            details: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
            details: None,
        }
    }

    /// Attach structured detail for the caller. Dropped for server-side kinds.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a weak-password error.
    pub fn weak_password(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WeakPassword, message)
    }

    /// The uniform login failure. Never says which half was wrong.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid credentials")
    }

    /// Create a missing-token error.
    pub fn missing_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingToken, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create an algorithm-mismatch error.
    pub fn invalid_algorithm(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAlgorithm, message)
    }

    /// Create a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExpired, message)
    }

    /// Create a token-revoked error.
    pub fn token_revoked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenRevoked, message)
    }

    /// Create a refresh-token not-found-or-revoked error.
    pub fn refresh_token_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RefreshTokenInvalid, message)
    }

    /// Create an account-locked error.
    pub fn account_locked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccountLocked, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Detail that is safe to hand to an API caller.
    pub fn public_details(&self) -> Option<&serde_json::Value> {
        if self.kind.is_internal() {
            None
        } else {
            self.details.as_ref()
        }
    }

    /// Message that is safe to hand to an API caller.
    pub fn public_message(&self) -> &str {
        if self.kind.is_internal() {
            "Internal server error"
        } else {
            &self.message
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
            details: self.details.clone(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
