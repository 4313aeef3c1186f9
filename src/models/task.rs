use serde::Serialize;

use crate::domain::{Department, Progress, TaskId, TaskStatus, UserId};
use crate::entities::{tasks, users};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: UserId,
    pub assigned_by: UserId,
    pub status: TaskStatus,
    pub progress: i32,
    pub deadline: Option<String>,
    pub documentation: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
    pub assignee_department: Option<Department>,
}

impl Task {
    pub(crate) fn from_row(task: tasks::Model, assignee: Option<users::Model>) -> Self {
        Self {
            id: TaskId::new(task.id),
            title: task.title,
            description: task.description,
            assigned_to: UserId::new(task.assigned_to),
            assigned_by: UserId::new(task.assigned_by),
            status: task.status,
            progress: task.progress,
            deadline: task.deadline,
            documentation: task.documentation,
            created_at: task.created_at,
            updated_at: task.updated_at,
            assignee_name: assignee.as_ref().map(|u| u.name.clone()),
            assignee_email: assignee.as_ref().map(|u| u.email.clone()),
            assignee_department: assignee.map(|u| u.department),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: UserId,
    pub assigned_by: UserId,
    pub status: TaskStatus,
    pub progress: Progress,
    pub deadline: Option<String>,
    pub documentation: Option<String>,
}

/// Task fields supplied by the creator. The assigner is the caller.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: UserId,
    pub status: Option<TaskStatus>,
    pub progress: Progress,
    pub deadline: Option<String>,
    pub documentation: Option<String>,
}

impl TaskDraft {
    /// Resolves the stored status: explicit if given, otherwise derived from
    /// the initial progress.
    #[must_use]
    pub fn into_new_task(self, assigned_by: UserId) -> NewTask {
        NewTask {
            status: self
                .status
                .unwrap_or_else(|| TaskStatus::from_progress(self.progress)),
            title: self.title,
            description: self.description,
            assigned_to: self.assigned_to,
            assigned_by,
            progress: self.progress,
            deadline: self.deadline,
            documentation: self.documentation,
        }
    }
}

/// A partial update of a task. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub status: Option<TaskStatus>,
    pub progress: Option<Progress>,
    pub deadline: Option<String>,
    pub documentation: Option<String>,
}

impl TaskUpdate {
    /// True when nothing beyond status and progress is being changed.
    #[must_use]
    pub fn only_status_or_progress(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.deadline.is_none()
            && self.documentation.is_none()
    }

    /// Fills in a status derived from progress when only progress was given.
    /// An explicit status is kept as sent.
    #[must_use]
    pub fn reconciled(mut self) -> Self {
        if self.status.is_none()
            && let Some(progress) = self.progress
        {
            self.status = Some(TaskStatus::from_progress(progress));
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Aggregate returned alongside a status-filtered task listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub average_progress: f64,
}

impl TaskSummary {
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let count = |status| tasks.iter().filter(|t| t.status == status).count();
        let progress: Vec<i32> = tasks.iter().map(|t| t.progress).collect();
        Self {
            total: tasks.len(),
            todo: count(TaskStatus::Todo),
            in_progress: count(TaskStatus::InProgress),
            completed: count(TaskStatus::Completed),
            average_progress: crate::domain::scoring::mean_progress(&progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_alone_derives_status() {
        let update = TaskUpdate {
            progress: Some(Progress::new(95).unwrap()),
            ..TaskUpdate::default()
        }
        .reconciled();
        assert_eq!(update.status, Some(TaskStatus::Completed));
    }

    #[test]
    fn explicit_status_wins_over_progress() {
        let update = TaskUpdate {
            progress: Some(Progress::new(95).unwrap()),
            status: Some(TaskStatus::InProgress),
            ..TaskUpdate::default()
        }
        .reconciled();
        assert_eq!(update.status, Some(TaskStatus::InProgress));
    }

    #[test]
    fn employee_edit_scope() {
        let progress_only = TaskUpdate {
            progress: Some(Progress::new(10).unwrap()),
            ..TaskUpdate::default()
        };
        assert!(progress_only.only_status_or_progress());

        let retitle = TaskUpdate {
            title: Some("New".to_string()),
            ..TaskUpdate::default()
        };
        assert!(!retitle.only_status_or_progress());
    }

    #[test]
    fn draft_status_defaults_from_progress() {
        let draft = TaskDraft {
            title: "Quarterly report".to_string(),
            assigned_to: UserId::new(3),
            progress: Progress::new(60).unwrap(),
            ..TaskDraft::default()
        };
        let task = draft.clone().into_new_task(UserId::new(1));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assigned_by, UserId::new(1));

        let explicit = TaskDraft {
            status: Some(TaskStatus::Todo),
            ..draft
        }
        .into_new_task(UserId::new(1));
        assert_eq!(explicit.status, TaskStatus::Todo);
    }

    #[test]
    fn summary_of_empty_listing() {
        let summary = TaskSummary::of(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.average_progress.abs() < f64::EPSILON);
    }
}
