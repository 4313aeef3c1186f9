use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::types::{CreateNotificationRequest, MessageResponse};
use super::validation::{required_text, validate_id};
use super::{ApiError, AppState};
use crate::domain::{NotificationId, Principal};
use crate::models::notification::{Notification, NotificationDraft};

/// GET /notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.notification_service().list(&principal).await?))
}

/// POST /notifications
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateNotificationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let Json(payload) = payload?;

    let draft = NotificationDraft {
        title: required_text(payload.title, "Title and message are required")?,
        message: required_text(payload.message, "Title and message are required")?,
        kind: payload.kind.unwrap_or_default(),
        link: payload.link.filter(|l| !l.trim().is_empty()),
        department: payload.department,
    };

    let notification = state
        .notification_service()
        .create(&principal, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// DELETE /notifications/{id}
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = NotificationId::new(validate_id(id, "notification")?);
    state.notification_service().delete(&principal, id).await?;
    Ok(Json(MessageResponse::new("Notification deleted successfully")))
}
