//! Overpayment endpoints
//!
//! `GET /overpayment` answers the configured demo loan with a bare number.
//! `POST /api/v1/overpayment` takes a loan in the body and returns the full report.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};

use crate::calculator::OverpaymentReport;
use crate::types::LoanRequest;

use super::{ApiError, AppState, SharedCalculator};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/overpayment", get(demo_overpayment))
        .route("/api/v1/overpayment", post(calculate_overpayment))
}

/// the rate lookup blocks, so calculations run on the blocking pool
async fn run_calculation(
    calculator: SharedCalculator,
    request: LoanRequest,
) -> Result<OverpaymentReport, ApiError> {
    let report =
        tokio::task::spawn_blocking(move || calculator.calculate_report(&request)).await??;
    Ok(report)
}

/// GET /overpayment
async fn demo_overpayment(State(state): State<AppState>) -> Result<Json<f64>, ApiError> {
    let request = state.config.demo.request();
    let report = run_calculation(state.calculator.clone(), request).await?;
    Ok(Json(report.overpayment.to_f64()))
}

/// POST /api/v1/overpayment
async fn calculate_overpayment(
    State(state): State<AppState>,
    payload: Result<Json<LoanRequest>, JsonRejection>,
) -> Result<Json<OverpaymentReport>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        principal = %request.principal,
        monthly_payment = %request.monthly_payment,
        client_type = %request.client_type,
        "overpayment requested"
    );
    let report = run_calculation(state.calculator.clone(), request).await?;
    Ok(Json(report))
}
