use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Department, NotificationKind, Role, SkillLevel, TaskStatus};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub phone_number: Option<String>,
    pub skill_level: Option<SkillLevel>,
    /// Free text such as "3 years". Numbers are accepted too.
    pub experience: Option<Value>,
    pub experience_level: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i32>,
    pub status: Option<TaskStatus>,
    pub progress: Option<Value>,
    pub deadline: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i32>,
    pub status: Option<TaskStatus>,
    pub progress: Option<Value>,
    pub deadline: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub progress: Option<Value>,
    pub documentation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub department: Option<Department>,
    pub video_url: Option<String>,
    pub segment_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRequest {
    pub duration: Option<i64>,
    pub position: Option<i64>,
    #[serde(default)]
    pub completed_segments: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    pub link: Option<String>,
    pub department: Option<Department>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    pub message: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
