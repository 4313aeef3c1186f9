use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::domain::Principal;
use crate::models::session::LoginSession;
use crate::services::dashboard_service::{
    AdminDashboard, EmployeeDashboard, TeamLeaderDashboard,
};

/// GET /admin/dashboard-stats
pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AdminDashboard>, ApiError> {
    Ok(Json(state.dashboard_service().admin(&principal).await?))
}

/// GET /team-leader/dashboard
pub async fn team_leader(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<TeamLeaderDashboard>, ApiError> {
    Ok(Json(state.dashboard_service().team_leader(&principal).await?))
}

/// GET /employee/dashboard
pub async fn employee(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<EmployeeDashboard>, ApiError> {
    Ok(Json(state.dashboard_service().employee(&principal).await?))
}

/// GET /login-sessions
pub async fn login_sessions(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<LoginSession>>, ApiError> {
    Ok(Json(state.auth_service().list_sessions(&principal).await?))
}
