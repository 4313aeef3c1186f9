//! `SeaORM` implementation of the `NotificationService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{NotificationScope, Store};
use crate::domain::{NotificationId, Principal, Role};
use crate::models::notification::{NewNotification, Notification, NotificationDraft};
use crate::services::error::ServiceError;
use crate::services::notification_service::NotificationService;

const LIST_LIMIT: u64 = 10;

pub struct SeaOrmNotificationService {
    store: Store,
}

impl SeaOrmNotificationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationService for SeaOrmNotificationService {
    async fn list(&self, principal: &Principal) -> Result<Vec<Notification>, ServiceError> {
        let scope = if principal.is_admin() {
            NotificationScope::All
        } else {
            NotificationScope::Member {
                user_id: principal.id,
                department: principal.department,
            }
        };
        Ok(self.store.notifications().list(scope, LIST_LIMIT).await?)
    }

    async fn create(
        &self,
        principal: &Principal,
        draft: NotificationDraft,
    ) -> Result<Notification, ServiceError> {
        let department = match principal.role {
            Role::Admin => draft.department,
            Role::TeamLeader => match draft.department {
                Some(department) if department != principal.department => {
                    return Err(ServiceError::forbidden(
                        "You can only send notifications to your own department",
                    ));
                }
                _ => Some(principal.department),
            },
            Role::Employee => {
                return Err(ServiceError::forbidden(
                    "Only team leaders and admins can create notifications",
                ));
            }
        };

        let id = self
            .store
            .notifications()
            .create(NewNotification {
                title: draft.title,
                message: draft.message,
                kind: draft.kind,
                link: draft.link,
                created_by: principal.id,
                department,
            })
            .await?;

        info!(notification_id = %id, created_by = %principal.id, "Notification created");

        self.store
            .notifications()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Notification not found"))
    }

    async fn delete(&self, principal: &Principal, id: NotificationId) -> Result<(), ServiceError> {
        let notification = self
            .store
            .notifications()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Notification not found"))?;

        if !principal.is_admin() && notification.created_by != Some(principal.id) {
            return Err(ServiceError::forbidden(
                "You can only delete your own notifications",
            ));
        }

        self.store.notifications().delete(id).await?;
        info!(notification_id = %id, deleted_by = %principal.id, "Notification deleted");
        Ok(())
    }
}
