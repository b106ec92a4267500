//! Unified Result Types

use crate::utils::AppError;

/// Result of any application-level operation that can surface to a handler.
pub type AppResult<T> = Result<T, AppError>;
