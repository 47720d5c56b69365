//! Printing API Module
//!
//! # Routes
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/transactions/{id}/print | POST | Print a stored transaction |
//! | /api/printer/status | GET | Printer availability probe |
//! | /api/printer/test | POST | Print a sample page |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Printing router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/transactions/{id}/print",
            post(handler::print_transaction),
        )
        .route("/api/printer/status", get(handler::printer_status))
        .route("/api/printer/test", post(handler::print_test))
}
