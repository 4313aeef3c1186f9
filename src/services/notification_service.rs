//! Domain service for the notification board.

use crate::domain::{NotificationId, Principal};
use crate::models::notification::{Notification, NotificationDraft};
use crate::services::error::ServiceError;

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Most recent notifications the caller may see.
    async fn list(&self, principal: &Principal) -> Result<Vec<Notification>, ServiceError>;

    /// Team leaders may only address their own department.
    async fn create(
        &self,
        principal: &Principal,
        draft: NotificationDraft,
    ) -> Result<Notification, ServiceError>;

    /// Admins or the creator only.
    async fn delete(&self, principal: &Principal, id: NotificationId) -> Result<(), ServiceError>;
}
