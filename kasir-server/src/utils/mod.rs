//! Shared utilities
//!
//! - [`error`] - application error type and HTTP mapping
//! - [`logger`] - tracing setup
//! - [`result`] - common result aliases

pub mod error;
pub mod logger;
pub mod result;

pub use error::{AppError, ErrorBody};
pub use result::AppResult;
