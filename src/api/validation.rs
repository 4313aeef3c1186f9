use serde_json::Value;

use super::ApiError;
use crate::domain::{Progress, TaskStatus};

/// Trims `value` and rejects it when absent or blank.
pub fn required_text(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Accepts a JSON integer in `0..=100`. Strings and fractions are rejected.
pub fn parse_progress(value: &Value) -> Result<Progress, ApiError> {
    let invalid = || ApiError::validation("Progress must be an integer between 0 and 100");
    let number = value.as_i64().ok_or_else(invalid)?;
    Progress::new(number).map_err(|_| invalid())
}

pub fn parse_status(value: &str) -> Result<TaskStatus, ApiError> {
    value.parse().map_err(|_| {
        ApiError::validation(format!(
            "Invalid status: {value}. Must be one of Todo, In Progress, Completed"
        ))
    })
}

/// Seconds reported by the video player.
pub fn non_negative_seconds(value: i64, field: &str) -> Result<i32, ApiError> {
    i32::try_from(value)
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| ApiError::validation(format!("{field} must be a non-negative integer")))
}

/// Experience is free text, but clients often send a bare number of years.
pub fn experience_text(value: Option<Value>) -> Result<String, ApiError> {
    match value {
        None | Some(Value::Null) => Ok("0".to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(ApiError::validation("Invalid value for field: experience")),
    }
}
