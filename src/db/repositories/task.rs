use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{Department, TaskId, TaskStatus, UserId};
use crate::entities::{tasks, users};
use crate::models::task::{NewTask, Task, TaskUpdate};

/// Which tasks a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    All,
    /// Tasks whose assignee belongs to one of these departments.
    Departments(Vec<Department>),
    /// Tasks assigned to exactly this user.
    AssignedTo(UserId),
}

pub struct TaskRepository {
    conn: DatabaseConnection,
}

impl TaskRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let row = tasks::Entity::find_by_id(id.value())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query task by ID")?;

        Ok(row.map(|(task, assignee)| Task::from_row(task, assignee)))
    }

    pub async fn list(&self, scope: &TaskScope, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let mut query = tasks::Entity::find().find_also_related(users::Entity);

        query = match scope {
            TaskScope::All => query,
            TaskScope::Departments(departments) => {
                query.filter(users::Column::Department.is_in(departments.iter().copied()))
            }
            TaskScope::AssignedTo(user_id) => {
                query.filter(tasks::Column::AssignedTo.eq(user_id.value()))
            }
        };

        if let Some(status) = status {
            query = query.filter(tasks::Column::Status.eq(status));
        }

        let rows = query
            .order_by_desc(tasks::Column::Deadline)
            .order_by_desc(tasks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tasks")?;

        Ok(rows
            .into_iter()
            .map(|(task, assignee)| Task::from_row(task, assignee))
            .collect())
    }

    pub async fn create(&self, new_task: NewTask) -> Result<TaskId> {
        let now = crate::db::timestamp();
        let model = tasks::ActiveModel {
            title: Set(new_task.title),
            description: Set(new_task.description),
            assigned_to: Set(new_task.assigned_to.value()),
            assigned_by: Set(new_task.assigned_by.value()),
            status: Set(new_task.status),
            progress: Set(new_task.progress.value()),
            deadline: Set(new_task.deadline),
            documentation: Set(new_task.documentation),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert task")?;

        Ok(TaskId::new(model.id))
    }

    /// Applies a partial update. Returns `false` when the task does not exist.
    pub async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<bool> {
        let Some(task) = tasks::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query task for update")?
        else {
            return Ok(false);
        };

        let mut active: tasks::ActiveModel = task.into();
        if let Some(title) = update.title {
            active.title = Set(title);
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(assignee) = update.assigned_to {
            active.assigned_to = Set(assignee.value());
        }
        if let Some(status) = update.status {
            active.status = Set(status);
        }
        if let Some(progress) = update.progress {
            active.progress = Set(progress.value());
        }
        if let Some(deadline) = update.deadline {
            active.deadline = Set(Some(deadline));
        }
        if let Some(documentation) = update.documentation {
            active.documentation = Set(Some(documentation));
        }
        active.updated_at = Set(crate::db::timestamp());

        active
            .update(&self.conn)
            .await
            .context("Failed to update task")?;

        Ok(true)
    }

    pub async fn delete(&self, id: TaskId) -> Result<bool> {
        let result = tasks::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete task")?;
        Ok(result.rows_affected > 0)
    }
}
