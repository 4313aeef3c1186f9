//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{Store, verify_password};
use crate::domain::password::check_strength;
use crate::domain::{Principal, Role, UserId};
use crate::models::user::{NewUser, User, UserUpdate, UserWithTaskCount};
use crate::services::error::ServiceError;
use crate::services::user_service::UserService;

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn find(&self, id: UserId) -> Result<User, ServiceError> {
        self.store
            .users()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// True when `user` is the only active admin left.
    async fn is_last_admin(&self, user: &User) -> Result<bool, ServiceError> {
        if user.role != Role::Admin || !user.is_active {
            return Ok(false);
        }
        Ok(self.store.users().count_active_by_role(Role::Admin).await? <= 1)
    }

    async fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> Result<(), ServiceError> {
        if self.store.users().email_taken(email, except).await? {
            return Err(ServiceError::validation("Email already exists"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn me(&self, principal: &Principal) -> Result<User, ServiceError> {
        self.find(principal.id).await
    }

    async fn list(&self, principal: &Principal) -> Result<Vec<UserWithTaskCount>, ServiceError> {
        let department = match principal.role {
            Role::Admin => None,
            Role::TeamLeader => Some(principal.department),
            Role::Employee => {
                return Err(ServiceError::forbidden("Access denied"));
            }
        };
        Ok(self.store.users().list_with_task_counts(department).await?)
    }

    async fn get(&self, principal: &Principal, id: UserId) -> Result<User, ServiceError> {
        let user = self.find(id).await?;

        let allowed = principal.is(id)
            || principal.is_admin()
            || (principal.is_team_leader() && user.department == principal.department);
        if !allowed {
            return Err(ServiceError::forbidden("Access denied"));
        }
        Ok(user)
    }

    async fn create(
        &self,
        principal: &Principal,
        new_user: NewUser,
    ) -> Result<User, ServiceError> {
        if !principal.is_admin() {
            return Err(ServiceError::forbidden("Only admins can create users"));
        }
        self.ensure_email_free(&new_user.email, None).await?;

        let user = self.store.users().create(new_user, &self.security).await?;
        info!(user_id = %user.id, role = %user.role, created_by = %principal.id, "User created");
        Ok(user)
    }

    async fn update(
        &self,
        principal: &Principal,
        id: UserId,
        update: UserUpdate,
    ) -> Result<User, ServiceError> {
        let update = if principal.is_admin() {
            update
        } else if principal.is(id) {
            update.self_service()
        } else {
            return Err(ServiceError::forbidden("You can only update your own profile"));
        };

        if update.is_empty() {
            return Err(ServiceError::validation("No valid fields to update"));
        }

        let current = self.find(id).await?;

        if let Some(email) = update.email.as_deref()
            && email != current.email
        {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let demoted = update.role.is_some_and(|role| role != Role::Admin)
            || update.is_active == Some(false);
        if demoted && self.is_last_admin(&current).await? {
            return Err(ServiceError::invariant("Cannot remove the last admin user"));
        }

        let user = self
            .store
            .users()
            .update(id, update)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        info!(user_id = %id, updated_by = %principal.id, "User updated");
        Ok(user)
    }

    async fn delete(&self, principal: &Principal, id: UserId) -> Result<(), ServiceError> {
        if !(principal.is_admin() || principal.is(id)) {
            return Err(ServiceError::forbidden("You can only delete your own account"));
        }

        let target = self.find(id).await?;

        if self.is_last_admin(&target).await? {
            return Err(ServiceError::invariant("Cannot delete the last admin user"));
        }

        if principal.is(id)
            && target.role == Role::TeamLeader
            && self
                .store
                .users()
                .count_other_team_leaders(target.department, id)
                .await?
                == 0
        {
            return Err(ServiceError::invariant(
                "Cannot delete the last team leader of the department",
            ));
        }

        let successor = if principal.is(id) {
            self.store
                .users()
                .successor_for(id, target.department)
                .await?
        } else {
            Some(principal.id)
        };

        self.store.users().delete(id, successor).await?;
        info!(user_id = %id, deleted_by = %principal.id, "User deleted");
        Ok(())
    }

    async fn change_password(
        &self,
        principal: &Principal,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if !principal.is(id) {
            return Err(ServiceError::forbidden("You can only change your own password"));
        }

        check_strength(new_password).map_err(ServiceError::validation)?;

        let hash = self
            .store
            .users()
            .password_hash(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        if !verify_password(hash, current_password).await? {
            return Err(ServiceError::Unauthenticated(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .users()
            .update_password(id, new_password, &self.security)
            .await?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    async fn reset_password(
        &self,
        principal: &Principal,
        id: UserId,
    ) -> Result<String, ServiceError> {
        if !(principal.is_admin() || principal.is(id)) {
            return Err(ServiceError::forbidden("Access denied"));
        }

        self.find(id).await?;

        let password = self.security.standard_password.clone();
        self.store
            .users()
            .update_password(id, &password, &self.security)
            .await?;

        info!(user_id = %id, reset_by = %principal.id, "Password reset to standard password");
        Ok(password)
    }
}
