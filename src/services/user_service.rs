//! Domain service for the user directory.
//!
//! Every operation takes the acting [`Principal`] and decides from its role
//! and department what the caller may see or change.

use crate::domain::{Principal, UserId};
use crate::models::user::{NewUser, User, UserUpdate, UserWithTaskCount};
use crate::services::error::ServiceError;

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// The caller's own record.
    async fn me(&self, principal: &Principal) -> Result<User, ServiceError>;

    /// Admins list everyone, team leaders their department. Employees are
    /// refused.
    async fn list(&self, principal: &Principal) -> Result<Vec<UserWithTaskCount>, ServiceError>;

    async fn get(&self, principal: &Principal, id: UserId) -> Result<User, ServiceError>;

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when the email is already in use.
    async fn create(&self, principal: &Principal, new_user: NewUser)
    -> Result<User, ServiceError>;

    /// Applies the fields the caller is allowed to change on `id`.
    ///
    /// Users may edit their own profile fields. Admins may additionally change
    /// role, department, skill and the active flag of anyone.
    async fn update(
        &self,
        principal: &Principal,
        id: UserId,
        update: UserUpdate,
    ) -> Result<User, ServiceError>;

    /// # Errors
    ///
    /// Returns [`ServiceError::Invariant`] when the target is the last admin,
    /// or a team leader deleting themselves while no other team leader remains
    /// in the department.
    async fn delete(&self, principal: &Principal, id: UserId) -> Result<(), ServiceError>;

    async fn change_password(
        &self,
        principal: &Principal,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError>;

    /// Sets the configured standard password and returns it.
    async fn reset_password(
        &self,
        principal: &Principal,
        id: UserId,
    ) -> Result<String, ServiceError>;
}
