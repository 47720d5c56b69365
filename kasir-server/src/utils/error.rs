//! Unified error handling
//!
//! Provides the application error type and its HTTP mapping:
//! - [`AppError`] - application error enum
//! - [`ErrorBody`] - wire shape for error responses
//!
//! # Status mapping
//!
//! | Variant | Status |
//! |---------|--------|
//! | NotFound | 404 |
//! | Invalid | 400 |
//! | PrinterUnavailable | 501 |
//! | PrinterCommunication | 502 |
//! | Database / Internal | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error response body
///
/// ```json
/// {
///   "error": "Transaction 42 not found",
///   "details": "..."
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Request errors (4xx) ==========
    #[error("Resource not found: {0}")]
    /// Missing resource (404)
    NotFound(String),

    #[error("Invalid request: {0}")]
    /// Malformed request (400)
    Invalid(String),

    // ========== Printing errors ==========
    #[error("Printer driver unavailable")]
    /// Printing stack not installed or not loadable (501)
    PrinterUnavailable { details: String },

    #[error("{message}")]
    /// Device-level communication failure (502)
    PrinterCommunication {
        message: String,
        details: Option<String>,
    },

    // ========== System errors (5xx) ==========
    #[error("Database error: {0}")]
    /// Storage failure (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// Anything unexpected (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            AppError::Invalid(_) => (StatusCode::BAD_REQUEST, None),
            AppError::PrinterUnavailable { details } => {
                (StatusCode::NOT_IMPLEMENTED, Some(details.clone()))
            }
            AppError::PrinterCommunication { details, .. } => {
                (StatusCode::BAD_GATEWAY, details.clone())
            }
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        if status.is_server_error() {
            error!(status = %status, error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = AppError::NotFound("Transaction 42".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::PrinterUnavailable {
            details: "libusb init failed".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

        let resp = AppError::PrinterCommunication {
            message: "copy 1 failed".into(),
            details: None,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
