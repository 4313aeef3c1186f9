use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::AppState;
use super::types::HealthResponse;

/// GET /health
///
/// Public. Reports 503 when the database does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    let response = HealthResponse {
        status: if database_ok { "ok" } else { "degraded" },
        database: if database_ok { "connected" } else { "unreachable" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
