//! Convenience result type alias for Galaxy.

use crate::error::AppError;

/// A specialized `Result` type for Galaxy operations.
pub type AppResult<T> = Result<T, AppError>;
