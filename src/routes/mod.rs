//! HTTP routes
//!
//! - overpayment: demo endpoint and JSON calculation endpoint
//! - health: liveness check

pub mod health;
pub mod overpayment;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::calculator::OverpaymentCalculator;
use crate::config::AppConfig;
use crate::errors::CalculatorError;
use crate::rates::RateProvider;

/// calculator shared by all handlers
pub type SharedCalculator = Arc<OverpaymentCalculator<Box<dyn RateProvider>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub calculator: SharedCalculator,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, calculator: SharedCalculator) -> Self {
        Self {
            config,
            calculator,
            start_time: std::time::Instant::now(),
        }
    }
}

/// error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Calculation(CalculatorError),
    /// body could not be read as a loan request
    BadRequest(String),
    Internal(String),
}

impl From<CalculatorError> for ApiError {
    fn from(err: CalculatorError) -> Self {
        ApiError::Calculation(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Calculation(err) if err.is_cannot_be_paid() => {
                (StatusCode::UNPROCESSABLE_ENTITY, "cannot_be_paid", err.to_string())
            }
            ApiError::Calculation(err) if err.is_invalid_input() => {
                (StatusCode::BAD_REQUEST, "invalid_request", err.to_string())
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            ApiError::Calculation(err) => {
                tracing::error!(error = %err, "calculation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string())
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "handler failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };

        let body = ErrorResponse {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_router(config: Arc<AppConfig>, calculator: SharedCalculator) -> Router {
    let state = AppState::new(config, calculator);

    Router::new()
        .merge(health::routes())
        .merge(overpayment::routes())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
}
