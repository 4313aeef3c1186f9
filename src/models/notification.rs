use serde::Serialize;

use crate::domain::{Department, NotificationId, NotificationKind, UserId};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub created_by: Option<UserId>,
    pub creator_name: Option<String>,
    pub department: Option<Department>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub created_by: UserId,
    pub department: Option<Department>,
}

/// Notification fields supplied by the creator.
#[derive(Debug, Clone, Default)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub department: Option<Department>,
}
