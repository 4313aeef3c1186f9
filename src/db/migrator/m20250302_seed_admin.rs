use crate::domain::{Department, Role, SkillLevel};
use crate::entities::prelude::*;
use crate::entities::users;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEED_ADMIN_EMAIL: &str = "admin@company.com";
const SEED_ADMIN_PASSWORD: &str = "password123";

fn hash_seed_password() -> Result<String, DbErr> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(SEED_ADMIN_PASSWORD.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Migration(format!("Failed to hash seed password: {e}")))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_seed_password()?;

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Name,
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::Role,
                users::Column::Department,
                users::Column::SkillLevel,
                users::Column::Experience,
                users::Column::ExperienceLevel,
                users::Column::IsActive,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                "Administrator".into(),
                SEED_ADMIN_EMAIL.into(),
                password_hash.into(),
                Role::Admin.as_str().into(),
                Department::It.as_str().into(),
                SkillLevel::Advanced.as_str().into(),
                "0".into(),
                0_i32.into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .on_conflict(
                OnConflict::column(users::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = sea_orm_migration::sea_query::Query::delete()
            .from_table(Users)
            .and_where(Expr::col(users::Column::Email).eq(SEED_ADMIN_EMAIL))
            .to_owned();

        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
