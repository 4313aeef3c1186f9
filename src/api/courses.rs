use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::types::{CreateCourseRequest, WatchRequest};
use super::validation::{non_negative_seconds, required_text, validate_id};
use super::{ApiError, AppState};
use crate::domain::{CourseId, Principal};
use crate::models::course::{
    Course, CourseDraft, Enrollment, MemberCourseProgress, WatchInput, WatchOutcome, WatchRecord,
};

/// GET /courses
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(state.course_service().list(&principal).await?))
}

/// POST /courses
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let Json(payload) = payload?;

    let draft = CourseDraft {
        title: required_text(payload.title, "Course title is required")?,
        description: payload.description,
        department: payload.department,
        video_url: payload.video_url,
        segment_count: payload.segment_count,
    };

    let course = state.course_service().create(&principal, draft).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// POST /courses/{id}/enroll
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Enrollment>, ApiError> {
    let Path(id) = path?;
    let id = CourseId::new(validate_id(id, "course")?);
    Ok(Json(state.course_service().enroll(&principal, id).await?))
}

/// POST /courses/{id}/watch
pub async fn record_watch(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<WatchRequest>, JsonRejection>,
) -> Result<Json<WatchOutcome>, ApiError> {
    let Path(id) = path?;
    let id = CourseId::new(validate_id(id, "course")?);
    let Json(payload) = payload?;

    let (Some(duration), Some(position)) = (payload.duration, payload.position) else {
        return Err(ApiError::validation("Duration and position are required"));
    };

    let input = WatchInput {
        duration: non_negative_seconds(duration, "duration")?,
        position: non_negative_seconds(position, "position")?,
        completed_segments: payload.completed_segments,
    };

    Ok(Json(
        state
            .course_service()
            .record_watch(&principal, id, input)
            .await?,
    ))
}

/// GET /courses/{id}/watch-history
pub async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<WatchRecord>>, ApiError> {
    let Path(id) = path?;
    let id = CourseId::new(validate_id(id, "course")?);
    Ok(Json(
        state.course_service().watch_history(&principal, id).await?,
    ))
}

/// GET /team-leader/course-progress
pub async fn team_course_progress(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<MemberCourseProgress>>, ApiError> {
    Ok(Json(state.course_service().team_progress(&principal).await?))
}
