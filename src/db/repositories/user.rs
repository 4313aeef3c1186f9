use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use std::collections::HashMap;
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::{Department, Role, UserId};
use crate::entities::{tasks, users};
use crate::models::user::{NewUser, User, UserUpdate, UserWithTaskCount};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the stored password hash.
    pub async fn get_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn password_hash(&self, id: UserId) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        Ok(user.map(|u| u.password_hash))
    }

    /// True when another account already uses `email`.
    pub async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id.value()));
        }
        let count = query
            .count(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;
        Ok(count > 0)
    }

    pub async fn create(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        let password = new_user.password.clone();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let now = crate::db::timestamp();
        let model = users::ActiveModel {
            name: Set(new_user.name),
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            role: Set(new_user.role),
            department: Set(new_user.department),
            phone_number: Set(new_user.phone_number),
            skill_level: Set(new_user.skill_level),
            experience: Set(new_user.experience),
            experience_level: Set(new_user.experience_level),
            description: Set(new_user.description),
            profile_image: Set(None),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Lists users, optionally limited to one department, with the number of
    /// tasks assigned to each.
    pub async fn list_with_task_counts(
        &self,
        department: Option<Department>,
    ) -> Result<Vec<UserWithTaskCount>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Id);
        if let Some(department) = department {
            query = query.filter(users::Column::Department.eq(department));
        }
        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        let ids: Vec<i32> = rows.iter().map(|u| u.id).collect();
        let counts: HashMap<i32, i64> = tasks::Entity::find()
            .select_only()
            .column(tasks::Column::AssignedTo)
            .column_as(tasks::Column::Id.count(), "tasks_count")
            .filter(tasks::Column::AssignedTo.is_in(ids))
            .group_by(tasks::Column::AssignedTo)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to count tasks per user")?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|model| {
                let tasks_count = counts
                    .get(&model.id)
                    .copied()
                    .and_then(|c| u64::try_from(c).ok())
                    .unwrap_or(0);
                UserWithTaskCount {
                    user: User::from(model),
                    tasks_count,
                }
            })
            .collect())
    }

    pub async fn list_by_department_and_role(
        &self,
        department: Department,
        role: Role,
    ) -> Result<Vec<User>> {
        let rows = users::Entity::find()
            .filter(users::Column::Department.eq(department))
            .filter(users::Column::Role.eq(role))
            .order_by_asc(users::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list department members")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Applies a partial update. Returns `None` when the user does not exist.
    pub async fn update(&self, id: UserId, update: UserUpdate) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(email) = update.email {
            active.email = Set(email);
        }
        if let Some(phone) = update.phone_number {
            active.phone_number = Set(Some(phone));
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(image) = update.profile_image {
            active.profile_image = Set(Some(image));
        }
        if let Some(department) = update.department {
            active.department = Set(department);
        }
        if let Some(skill_level) = update.skill_level {
            active.skill_level = Set(skill_level);
        }
        if let Some(experience) = update.experience {
            active.experience = Set(experience);
        }
        if let Some(level) = update.experience_level {
            active.experience_level = Set(level);
        }
        if let Some(role) = update.role {
            active.role = Set(role);
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(crate::db::timestamp());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;

        Ok(Some(User::from(model)))
    }

    /// Update password for a user (hashes the new password)
    pub async fn update_password(
        &self,
        id: UserId,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(crate::db::timestamp());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Deletes the user. Tasks they assigned are handed to `successor` in the
    /// same transaction; tasks assigned to them go with them.
    pub async fn delete(&self, id: UserId, successor: Option<UserId>) -> Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin user delete transaction")?;

        if let Some(successor) = successor {
            tasks::Entity::update_many()
                .col_expr(tasks::Column::AssignedBy, Expr::value(successor.value()))
                .filter(tasks::Column::AssignedBy.eq(id.value()))
                .exec(&txn)
                .await
                .context("Failed to reassign tasks")?;
        }

        let result = users::Entity::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit()
            .await
            .context("Failed to commit user delete transaction")?;
        Ok(result.rows_affected > 0)
    }

    /// Who inherits the tasks `leaving` assigned: another team leader of the
    /// department, otherwise the longest-standing active admin.
    pub async fn successor_for(
        &self,
        leaving: UserId,
        department: Department,
    ) -> Result<Option<UserId>> {
        let team_leader = users::Entity::find()
            .filter(users::Column::Role.eq(Role::TeamLeader))
            .filter(users::Column::Department.eq(department))
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::Id.ne(leaving.value()))
            .order_by_asc(users::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to look up team leader successor")?;
        if let Some(user) = team_leader {
            return Ok(Some(UserId::new(user.id)));
        }

        let admin = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Admin))
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::Id.ne(leaving.value()))
            .order_by_asc(users::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to look up admin successor")?;
        Ok(admin.map(|user| UserId::new(user.id)))
    }

    pub async fn count_active_by_role(&self, role: Role) -> Result<u64> {
        users::Entity::find()
            .filter(users::Column::Role.eq(role))
            .filter(users::Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count active users by role")
    }

    /// Team leaders in `department` other than `except`.
    pub async fn count_other_team_leaders(
        &self,
        department: Department,
        except: UserId,
    ) -> Result<u64> {
        users::Entity::find()
            .filter(users::Column::Role.eq(Role::TeamLeader))
            .filter(users::Column::Department.eq(department))
            .filter(users::Column::Id.ne(except.value()))
            .count(&self.conn)
            .await
            .context("Failed to count team leaders")
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash string.
///
/// Argon2 is CPU-intensive, so the comparison runs on the blocking pool.
pub async fn verify_password(password_hash: String, password: &str) -> Result<bool> {
    let password = password.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}
