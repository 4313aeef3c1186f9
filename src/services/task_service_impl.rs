//! `SeaORM` implementation of the `TaskService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::AccessConfig;
use crate::db::{Store, TaskScope};
use crate::domain::{Principal, Progress, Role, TaskId, TaskStatus, UserId};
use crate::models::task::{Task, TaskDraft, TaskSummary, TaskUpdate};
use crate::services::error::ServiceError;
use crate::services::task_service::{TaskService, TasksByStatus};

pub struct SeaOrmTaskService {
    store: Store,
    access: AccessConfig,
}

impl SeaOrmTaskService {
    #[must_use]
    pub const fn new(store: Store, access: AccessConfig) -> Self {
        Self { store, access }
    }

    fn scope(&self, principal: &Principal) -> TaskScope {
        match principal.role {
            Role::Admin => TaskScope::All,
            Role::TeamLeader => {
                TaskScope::Departments(self.access.visible_departments(principal.department))
            }
            Role::Employee => TaskScope::AssignedTo(principal.id),
        }
    }

    fn can_see(&self, principal: &Principal, task: &Task) -> bool {
        match self.scope(principal) {
            TaskScope::All => true,
            TaskScope::Departments(departments) => task
                .assignee_department
                .is_some_and(|d| departments.contains(&d)),
            TaskScope::AssignedTo(user_id) => task.assigned_to == user_id,
        }
    }

    async fn find_visible(&self, principal: &Principal, id: TaskId) -> Result<Task, ServiceError> {
        self.store
            .tasks()
            .get(id)
            .await?
            .filter(|task| self.can_see(principal, task))
            .ok_or_else(|| ServiceError::not_found("Task not found"))
    }

    /// Loads a task for modification. A task that exists but lies outside the
    /// caller's scope is a permission error, not a missing one.
    async fn find_writable(&self, principal: &Principal, id: TaskId) -> Result<Task, ServiceError> {
        let task = self.reload(id).await?;
        if !self.can_see(principal, &task) {
            return Err(ServiceError::forbidden(
                "You do not have permission to modify this task",
            ));
        }
        Ok(task)
    }

    /// The assignee must exist, and a team leader may only pick someone from
    /// a department they oversee.
    async fn check_assignee(&self, principal: &Principal, assignee: UserId) -> Result<(), ServiceError> {
        let user = self
            .store
            .users()
            .get_by_id(assignee)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assigned user not found"))?;

        if principal.is_team_leader()
            && !self
                .access
                .visible_departments(principal.department)
                .contains(&user.department)
        {
            return Err(ServiceError::forbidden(
                "You can only assign tasks within your department",
            ));
        }
        Ok(())
    }

    async fn reload(&self, id: TaskId) -> Result<Task, ServiceError> {
        self.store
            .tasks()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task not found"))
    }
}

#[async_trait]
impl TaskService for SeaOrmTaskService {
    async fn list(&self, principal: &Principal) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.tasks().list(&self.scope(principal), None).await?)
    }

    async fn get(&self, principal: &Principal, id: TaskId) -> Result<Task, ServiceError> {
        self.find_visible(principal, id).await
    }

    async fn create(&self, principal: &Principal, draft: TaskDraft) -> Result<Task, ServiceError> {
        if principal.is_employee() {
            return Err(ServiceError::forbidden(
                "Only team leaders and admins can create tasks",
            ));
        }

        self.check_assignee(principal, draft.assigned_to).await?;

        let id = self
            .store
            .tasks()
            .create(draft.into_new_task(principal.id))
            .await?;

        info!(task_id = %id, assigned_by = %principal.id, "Task created");
        self.reload(id).await
    }

    async fn update(
        &self,
        principal: &Principal,
        id: TaskId,
        update: TaskUpdate,
    ) -> Result<Task, ServiceError> {
        self.find_writable(principal, id).await?;

        if update.is_empty() {
            return Err(ServiceError::validation("No valid fields to update"));
        }

        if principal.is_employee() && !update.only_status_or_progress() {
            return Err(ServiceError::forbidden(
                "Employees can only update task status and progress",
            ));
        }

        if let Some(assignee) = update.assigned_to {
            self.check_assignee(principal, assignee).await?;
        }

        let update = update.reconciled();
        if !self.store.tasks().update(id, update).await? {
            return Err(ServiceError::not_found("Task not found"));
        }

        info!(task_id = %id, updated_by = %principal.id, "Task updated");
        self.reload(id).await
    }

    async fn update_progress(
        &self,
        principal: &Principal,
        id: TaskId,
        progress: Progress,
        documentation: Option<String>,
    ) -> Result<Task, ServiceError> {
        self.find_writable(principal, id).await?;

        let update = TaskUpdate {
            status: Some(TaskStatus::from_progress(progress)),
            progress: Some(progress),
            documentation,
            ..TaskUpdate::default()
        };
        if !self.store.tasks().update(id, update).await? {
            return Err(ServiceError::not_found("Task not found"));
        }

        info!(task_id = %id, progress = progress.value(), "Task progress updated");
        self.reload(id).await
    }

    async fn delete(&self, principal: &Principal, id: TaskId) -> Result<(), ServiceError> {
        let task = self.find_writable(principal, id).await?;

        // A creator since demoted to Employee can no longer delete.
        if principal.is_employee() || task.assigned_by != principal.id {
            return Err(ServiceError::forbidden(
                "Only the user who assigned this task can delete it",
            ));
        }

        self.store.tasks().delete(id).await?;
        info!(task_id = %id, deleted_by = %principal.id, "Task deleted");
        Ok(())
    }

    async fn by_status(
        &self,
        principal: &Principal,
        status: Option<TaskStatus>,
    ) -> Result<TasksByStatus, ServiceError> {
        let tasks = self
            .store
            .tasks()
            .list(&self.scope(principal), status)
            .await?;
        let summary = TaskSummary::of(&tasks);
        Ok(TasksByStatus { tasks, summary })
    }
}
