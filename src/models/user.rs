use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{Department, Role, SkillLevel, UserId};
use crate::entities::users;

/// A user record with the password hash stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: Department,
    pub phone_number: Option<String>,
    pub skill_level: SkillLevel,
    pub experience: String,
    pub experience_level: i32,
    pub description: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            name: model.name,
            email: model.email,
            role: model.role,
            department: model.department,
            phone_number: model.phone_number,
            skill_level: model.skill_level,
            experience: model.experience,
            experience_level: model.experience_level,
            description: model.description,
            profile_image: model.profile_image,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTaskCount {
    #[serde(flatten)]
    pub user: User,
    pub tasks_count: u64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: Department,
    pub phone_number: Option<String>,
    pub skill_level: SkillLevel,
    pub experience: String,
    pub experience_level: i32,
    pub description: Option<String>,
}

/// A partial update of a user record. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
    pub profile_image: Option<String>,
    pub department: Option<Department>,
    pub skill_level: Option<SkillLevel>,
    pub experience: Option<String>,
    pub experience_level: Option<i32>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// The named field in an update body could not be coerced to its type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for field: {0}")]
pub struct InvalidField(pub String);

impl UserUpdate {
    /// Builds an update from a JSON object. Unknown keys and `null` values
    /// are skipped.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, InvalidField> {
        let mut update = Self::default();

        for (key, value) in body {
            if value.is_null() {
                continue;
            }
            let invalid = || InvalidField(key.clone());
            match key.as_str() {
                "name" => update.name = Some(text(value).ok_or_else(invalid)?),
                "email" => update.email = Some(text(value).ok_or_else(invalid)?),
                "phoneNumber" => update.phone_number = Some(text(value).ok_or_else(invalid)?),
                "description" | "bio" => {
                    update.description = Some(text(value).ok_or_else(invalid)?);
                }
                "profileImage" => update.profile_image = Some(text(value).ok_or_else(invalid)?),
                "department" => update.department = Some(parse_enum(value).ok_or_else(invalid)?),
                "skillLevel" => update.skill_level = Some(parse_enum(value).ok_or_else(invalid)?),
                "role" => update.role = Some(parse_enum(value).ok_or_else(invalid)?),
                "experience" => update.experience = Some(experience(value).ok_or_else(invalid)?),
                "experienceLevel" => {
                    update.experience_level = Some(integer(value).ok_or_else(invalid)?);
                }
                "isActive" => update.is_active = Some(boolean(value).ok_or_else(invalid)?),
                _ => {}
            }
        }

        Ok(update)
    }

    /// Drops every field a user may not change on their own record.
    #[must_use]
    pub fn self_service(self) -> Self {
        Self {
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            description: self.description,
            profile_image: self.profile_image,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(|s| s.trim().to_string())
}

fn parse_enum<T: std::str::FromStr>(value: &Value) -> Option<T> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn experience(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}
