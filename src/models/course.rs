use serde::Serialize;

use crate::domain::{CourseId, Department, UserId};
use crate::entities::{course_enrollments, course_watch_history, courses};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub department: Department,
    pub video_url: Option<String>,
    pub segment_count: i32,
    pub created_at: String,
    pub enrolled_users: u64,
}

impl Course {
    pub(crate) fn from_row(model: courses::Model, enrolled_users: u64) -> Self {
        Self {
            id: CourseId::new(model.id),
            title: model.title,
            description: model.description,
            department: model.department,
            video_url: model.video_url,
            segment_count: model.segment_count,
            created_at: model.created_at,
            enrolled_users,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub department: Department,
    pub video_url: Option<String>,
    pub segment_count: i32,
    pub created_by: UserId,
}

/// Course fields supplied by the creator. Department and segment count fall
/// back to the creator's department and [`DEFAULT_SEGMENT_COUNT`].
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub title: String,
    pub description: Option<String>,
    pub department: Option<Department>,
    pub video_url: Option<String>,
    pub segment_count: Option<i32>,
}

pub const DEFAULT_SEGMENT_COUNT: i32 = 10;
pub const MAX_SEGMENT_COUNT: i32 = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: CourseId,
    pub course_title: Option<String>,
    pub progress: i32,
    pub completed: bool,
    pub enrolled_at: String,
    pub last_accessed: Option<String>,
    pub last_position: i32,
}

impl Enrollment {
    pub(crate) fn from_row(model: course_enrollments::Model, course: Option<courses::Model>) -> Self {
        Self {
            course_id: CourseId::new(model.course_id),
            course_title: course.map(|c| c.title),
            progress: model.progress,
            completed: model.completed,
            enrolled_at: model.enrolled_at,
            last_accessed: model.last_accessed,
            last_position: model.last_position,
        }
    }
}

/// One watch event reported by the player.
#[derive(Debug, Clone, Default)]
pub struct WatchInput {
    pub duration: i32,
    pub position: i32,
    pub completed_segments: Vec<u32>,
}

/// One day of watching for a user and course.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub watch_date: String,
    pub watch_duration: i32,
    pub last_position: i32,
    pub completed_segments: Vec<u32>,
    pub updated_at: String,
}

impl From<course_watch_history::Model> for WatchRecord {
    fn from(model: course_watch_history::Model) -> Self {
        Self {
            completed_segments: decode_segments(&model.completed_segments),
            watch_date: model.watch_date,
            watch_duration: model.watch_duration,
            last_position: model.last_position,
            updated_at: model.updated_at,
        }
    }
}

/// Result of recording a watch event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOutcome {
    pub today: WatchRecord,
    pub enrollment: Enrollment,
}

/// One employee's enrollment in one course, with watch totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCourseProgress {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub progress: i32,
    pub completed: bool,
    pub last_accessed: Option<String>,
    pub total_watch_seconds: i64,
    pub days_watched: i64,
}

/// Segment lists are stored as a JSON array. Anything unreadable decodes as empty.
#[must_use]
pub fn decode_segments(raw: &str) -> Vec<u32> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[must_use]
pub fn encode_segments(segments: &[u32]) -> String {
    let mut sorted = segments.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    serde_json::to_string(&sorted).unwrap_or_else(|_| "[]".to_string())
}
