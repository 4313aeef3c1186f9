use sea_orm::entity::prelude::*;

use crate::domain::{Department, Role, SkillLevel};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: Role,

    pub department: Department,

    pub phone_number: Option<String>,

    pub skill_level: SkillLevel,

    /// Free text, e.g. "3 years".
    pub experience: String,

    pub experience_level: i32,

    pub description: Option<String>,

    pub profile_image: Option<String>,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::login_sessions::Entity")]
    LoginSessions,
    #[sea_orm(has_many = "super::course_enrollments::Entity")]
    CourseEnrollments,
}

impl Related<super::login_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoginSessions.def()
    }
}

impl Related<super::course_enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseEnrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
