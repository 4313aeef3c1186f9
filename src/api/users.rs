use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::types::{ChangePasswordRequest, CreateUserRequest, MessageResponse, ResetPasswordResponse};
use super::validation::{experience_text, required_text, validate_id};
use super::{ApiError, AppState};
use crate::domain::{Principal, UserId};
use crate::models::user::{NewUser, User, UserUpdate, UserWithTaskCount};

const MISSING_FIELDS: &str = "Missing required fields";

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service().me(&principal).await?))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<UserWithTaskCount>>, ApiError> {
    Ok(Json(state.user_service().list(&principal).await?))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = path?;
    let id = UserId::new(validate_id(id, "user")?);
    Ok(Json(state.user_service().get(&principal, id).await?))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(payload) = payload?;

    let (Some(role), Some(department)) = (payload.role, payload.department) else {
        return Err(ApiError::validation(MISSING_FIELDS));
    };
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation(MISSING_FIELDS))?;

    let new_user = NewUser {
        name: required_text(payload.name, MISSING_FIELDS)?,
        email: required_text(payload.email, MISSING_FIELDS)?,
        password,
        role,
        department,
        phone_number: payload.phone_number,
        skill_level: payload.skill_level.unwrap_or_default(),
        experience: experience_text(payload.experience)?,
        experience_level: payload.experience_level.unwrap_or(0),
        description: payload.description,
    };

    let user = state.user_service().create(&principal, new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /users/{id}
///
/// Accepts any subset of the profile fields. Keys the caller may not change
/// are ignored.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = path?;
    let id = UserId::new(validate_id(id, "user")?);
    let Json(body) = payload?;

    let update = UserUpdate::from_json(&body).map_err(|e| ApiError::validation(e.to_string()))?;
    Ok(Json(state.user_service().update(&principal, id, update).await?))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = UserId::new(validate_id(id, "user")?);
    state.user_service().delete(&principal, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// PUT /users/{id}/password
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = UserId::new(validate_id(id, "user")?);
    let Json(payload) = payload?;
    change_password(&state, &principal, id, payload).await
}

/// Shared by the user and team leader password endpoints.
pub(super) async fn change_password(
    state: &AppState,
    principal: &Principal,
    id: UserId,
    payload: ChangePasswordRequest,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(current), Some(new)) = (payload.current_password, payload.new_password) else {
        return Err(ApiError::validation(
            "Current password and new password are required",
        ));
    };

    state
        .user_service()
        .change_password(principal, id, &current, &new)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// POST /users/reset-password/{id}
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ResetPasswordResponse>, ApiError> {
    let Path(id) = path?;
    let id = UserId::new(validate_id(id, "user")?);
    let new_password = state.user_service().reset_password(&principal, id).await?;
    Ok(Json(ResetPasswordResponse {
        message: "Password reset to the standard password".to_string(),
        new_password,
    }))
}
