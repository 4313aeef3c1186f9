//! Domain types for the HR backend with strong typing.
//!
//! Identifiers are newtypes so a `TaskId` can never be passed where a
//! `UserId` is expected. The enumerations double as `SeaORM` active enums and
//! are stored as their display strings.

pub mod password;
pub mod scoring;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Returns the underlying i32 value.
            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                i32::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

id_newtype!(
    /// Unique identifier for a user account.
    UserId
);
id_newtype!(
    /// Unique identifier for a task.
    TaskId
);
id_newtype!(
    /// Unique identifier for a course.
    CourseId
);
id_newtype!(NotificationId);

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Role {
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "TeamLeader")]
    TeamLeader,
    #[sea_orm(string_value = "Employee")]
    Employee,
}

string_enum!(Role, "role", {
    Admin => "Admin",
    TeamLeader => "TeamLeader",
    Employee => "Employee",
});

impl Role {
    /// Landing page the frontend should open after login.
    #[must_use]
    pub const fn redirect_path(&self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::TeamLeader => "/team-leader",
            Self::Employee => "/employee",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Department {
    #[sea_orm(string_value = "IT")]
    #[serde(rename = "IT")]
    It,
    #[sea_orm(string_value = "Finance")]
    Finance,
    #[sea_orm(string_value = "Sales")]
    Sales,
    #[sea_orm(string_value = "Customer-Service")]
    #[serde(rename = "Customer-Service")]
    CustomerService,
}

string_enum!(Department, "department", {
    It => "IT",
    Finance => "Finance",
    Sales => "Sales",
    CustomerService => "Customer-Service",
});

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum SkillLevel {
    #[default]
    #[sea_orm(string_value = "Beginner")]
    Beginner,
    #[sea_orm(string_value = "Intermediate")]
    Intermediate,
    #[sea_orm(string_value = "Advanced")]
    Advanced,
}

string_enum!(SkillLevel, "skill level", {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
});

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "Todo")]
    Todo,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

string_enum!(TaskStatus, "task status", {
    Todo => "Todo",
    InProgress => "In Progress",
    Completed => "Completed",
});

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    /// Status implied by a progress percentage.
    #[must_use]
    pub const fn from_progress(progress: Progress) -> Self {
        match progress.value() {
            90.. => Self::Completed,
            50.. => Self::InProgress,
            _ => Self::Todo,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[sea_orm(string_value = "task")]
    Task,
    #[sea_orm(string_value = "course")]
    Course,
    #[sea_orm(string_value = "job")]
    Job,
    #[default]
    #[sea_orm(string_value = "general")]
    General,
}

string_enum!(NotificationKind, "notification type", {
    Task => "task",
    Course => "course",
    Job => "job",
    General => "general",
});

/// Completion percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Progress(i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("progress must be an integer between 0 and 100, got {0}")]
pub struct ProgressOutOfRange(pub i64);

impl Progress {
    pub const COMPLETE: Self = Self(100);

    pub fn new(value: i64) -> Result<Self, ProgressOutOfRange> {
        i32::try_from(value)
            .ok()
            .filter(|v| (0..=100).contains(v))
            .map(Self)
            .ok_or(ProgressOutOfRange(value))
    }

    /// Clamps a stored value into range. Rows written by older clients may
    /// hold anything.
    #[must_use]
    pub const fn saturating(value: i32) -> Self {
        if value < 0 {
            Self(0)
        } else if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

/// The authenticated caller of a request.
///
/// Resolved from storage on every request by the auth middleware, so a role
/// or department change applies to the very next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub department: Department,
}

impl Principal {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn is_team_leader(&self) -> bool {
        self.role == Role::TeamLeader
    }

    #[must_use]
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    #[must_use]
    pub fn is(&self, id: UserId) -> bool {
        self.id == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_conversions() {
        let id = UserId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(UserId::from(42), id);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn status_follows_progress_thresholds() {
        let status = |p| TaskStatus::from_progress(Progress::new(p).unwrap());
        assert_eq!(status(0), TaskStatus::Todo);
        assert_eq!(status(49), TaskStatus::Todo);
        assert_eq!(status(50), TaskStatus::InProgress);
        assert_eq!(status(89), TaskStatus::InProgress);
        assert_eq!(status(90), TaskStatus::Completed);
        assert_eq!(status(100), TaskStatus::Completed);
    }

    #[test]
    fn progress_rejects_out_of_range() {
        assert!(Progress::new(-1).is_err());
        assert!(Progress::new(101).is_err());
        assert!(Progress::new(i64::from(i32::MAX) + 1).is_err());
        assert_eq!(Progress::new(100).unwrap(), Progress::COMPLETE);
        assert_eq!(Progress::saturating(140).value(), 100);
        assert_eq!(Progress::saturating(-3).value(), 0);
    }

    #[test]
    fn enums_use_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::to_string(&Department::CustomerService).unwrap(),
            "\"Customer-Service\""
        );
        assert_eq!(
            serde_json::from_str::<Department>("\"IT\"").unwrap(),
            Department::It
        );
        assert_eq!(
            serde_json::to_string(&NotificationKind::Job).unwrap(),
            "\"job\""
        );
        assert_eq!("In Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("Done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn redirect_paths_per_role() {
        assert_eq!(Role::Admin.redirect_path(), "/admin");
        assert_eq!(Role::TeamLeader.redirect_path(), "/team-leader");
        assert_eq!(Role::Employee.redirect_path(), "/employee");
    }
}
