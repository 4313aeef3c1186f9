use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::domain::{Department, NotificationId, UserId};
use crate::entities::{notifications, users};
use crate::models::notification::{NewNotification, Notification};

/// Which notifications a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationScope {
    All,
    /// Owned by the user, addressed to the department, or created by
    /// someone in the department.
    Member {
        user_id: UserId,
        department: Department,
    },
}

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

fn to_notification(model: notifications::Model, creator: Option<users::Model>) -> Notification {
    Notification {
        id: NotificationId::new(model.id),
        title: model.title,
        message: model.message,
        kind: model.kind,
        link: model.link,
        created_by: model.user_id.map(UserId::new),
        creator_name: creator.map(|u| u.name),
        department: model.department,
        created_at: model.created_at,
    }
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, scope: NotificationScope, limit: u64) -> Result<Vec<Notification>> {
        let mut query = notifications::Entity::find().find_also_related(users::Entity);

        if let NotificationScope::Member {
            user_id,
            department,
        } = scope
        {
            query = query.filter(
                Condition::any()
                    .add(notifications::Column::UserId.eq(user_id.value()))
                    .add(notifications::Column::Department.eq(department))
                    .add(users::Column::Department.eq(department)),
            );
        }

        let rows = query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")?;

        Ok(rows
            .into_iter()
            .map(|(notification, creator)| to_notification(notification, creator))
            .collect())
    }

    pub async fn get(&self, id: NotificationId) -> Result<Option<Notification>> {
        let row = notifications::Entity::find_by_id(id.value())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query notification by ID")?;

        Ok(row.map(|(notification, creator)| to_notification(notification, creator)))
    }

    pub async fn create(&self, new: NewNotification) -> Result<NotificationId> {
        let model = notifications::ActiveModel {
            title: Set(new.title),
            message: Set(new.message),
            kind: Set(new.kind),
            link: Set(new.link),
            user_id: Set(Some(new.created_by.value())),
            department: Set(new.department),
            created_at: Set(crate::db::timestamp()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert notification")?;

        Ok(NotificationId::new(model.id))
    }

    pub async fn delete(&self, id: NotificationId) -> Result<bool> {
        let result = notifications::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete notification")?;
        Ok(result.rows_affected > 0)
    }
}
