//! Self-service endpoints for team leaders.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::types::{ChangePasswordRequest, MessageResponse};
use super::users::change_password;
use super::{ApiError, AppState};
use crate::domain::Principal;
use crate::models::user::{User, UserUpdate};

fn require_team_leader(principal: &Principal) -> Result<(), ApiError> {
    if principal.is_team_leader() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Team leader access required"))
    }
}

/// PUT /team-leader/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    require_team_leader(&principal)?;
    let Json(body) = payload?;

    let update = UserUpdate::from_json(&body)
        .map_err(|e| ApiError::validation(e.to_string()))?
        .self_service();

    Ok(Json(
        state
            .user_service()
            .update(&principal, principal.id, update)
            .await?,
    ))
}

/// PUT /team-leader/password
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_team_leader(&principal)?;
    let Json(payload) = payload?;
    change_password(&state, &principal, principal.id, payload).await
}

/// DELETE /team-leader/account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_team_leader(&principal)?;
    state.user_service().delete(&principal, principal.id).await?;
    Ok(Json(MessageResponse::new("Account deleted successfully")))
}
