use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;

use super::types::{
    CreateTaskRequest, MessageResponse, ProgressRequest, StatusQuery, UpdateTaskRequest,
};
use super::validation::{parse_progress, parse_status, required_text, validate_id};
use super::{ApiError, AppState};
use crate::domain::{Principal, TaskId, UserId};
use crate::models::task::{Task, TaskDraft, TaskUpdate};
use crate::services::TasksByStatus;

/// GET /tasks
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.task_service().list(&principal).await?))
}

/// GET /tasks/{id}
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = path?;
    let id = TaskId::new(validate_id(id, "task")?);
    Ok(Json(state.task_service().get(&principal, id).await?))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(payload) = payload?;

    let title = required_text(payload.title, "Title and assignee are required")?;
    let assigned_to = payload
        .assigned_to
        .ok_or_else(|| ApiError::validation("Title and assignee are required"))?;
    let progress = payload
        .progress
        .as_ref()
        .map(parse_progress)
        .transpose()?
        .unwrap_or_default();

    let draft = TaskDraft {
        title,
        description: payload.description,
        assigned_to: UserId::new(validate_id(assigned_to, "user")?),
        status: payload.status,
        progress,
        deadline: payload.deadline,
        documentation: payload.documentation,
    };

    let task = state.task_service().create(&principal, draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /tasks/{id}
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = path?;
    let id = TaskId::new(validate_id(id, "task")?);
    let Json(payload) = payload?;

    let update = TaskUpdate {
        title: payload.title,
        description: payload.description,
        assigned_to: payload
            .assigned_to
            .map(|a| validate_id(a, "user").map(UserId::new))
            .transpose()?,
        status: payload.status,
        progress: payload.progress.as_ref().map(parse_progress).transpose()?,
        deadline: payload.deadline,
        documentation: payload.documentation,
    };

    Ok(Json(state.task_service().update(&principal, id, update).await?))
}

/// PUT /tasks/{id}/progress
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = path?;
    let id = TaskId::new(validate_id(id, "task")?);
    let Json(payload) = payload?;

    let progress = parse_progress(payload.progress.as_ref().unwrap_or(&Value::Null))?;

    let task = state
        .task_service()
        .update_progress(&principal, id, progress, payload.documentation)
        .await?;
    Ok(Json(task))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = TaskId::new(validate_id(id, "task")?);
    state.task_service().delete(&principal, id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

/// GET /tasks/by-status?status=
pub async fn tasks_by_status(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<TasksByStatus>, ApiError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .transpose()?;

    Ok(Json(state.task_service().by_status(&principal, status).await?))
}
