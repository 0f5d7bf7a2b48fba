//! Convenience result type alias for Spectra.

use crate::error::AppError;

/// A specialized `Result` type for Spectra operations.
pub type AppResult<T> = Result<T, AppError>;
