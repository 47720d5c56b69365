//! Printing API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::printing::PrinterStatus;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct PrintQuery {
    /// Copies to print; defaults to the operator's printCopies setting
    pub copies: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub ok: bool,
    pub copies: u32,
}

/// Print a stored transaction's receipt
pub async fn print_transaction(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
    Query(query): Query<PrintQuery>,
) -> AppResult<Json<PrintResponse>> {
    let copies = state
        .print_service
        .print_transaction(id, query.copies)
        .await?;
    Ok(Json(PrintResponse { ok: true, copies }))
}

/// Report printer availability without printing
pub async fn printer_status(State(state): State<ServerState>) -> Json<PrinterStatus> {
    Json(state.print_service.printer_status().await)
}

/// Print a sample page to verify the printing chain end to end
pub async fn print_test(State(state): State<ServerState>) -> AppResult<Json<PrintResponse>> {
    state.print_service.print_test_page().await?;
    Ok(Json(PrintResponse { ok: true, copies: 1 }))
}
