use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// "http" or "offline"
    pub rate_source: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let rate_source = if state.config.rate_service.offline {
        "offline"
    } else {
        "http"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        rate_source: rate_source.to_string(),
    })
}
