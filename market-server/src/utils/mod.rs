//! Utility modules: errors, results, logging, validation

pub mod error;
pub mod logger;
pub mod result;
pub mod validation;

pub use error::{AppError, AppResponse};
pub use result::AppResult;
