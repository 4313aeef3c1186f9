//! Domain service for the task board.

use serde::Serialize;

use crate::domain::{Principal, Progress, TaskId, TaskStatus};
use crate::models::task::{Task, TaskDraft, TaskSummary, TaskUpdate};
use crate::services::error::ServiceError;

/// A status-filtered listing with its rollup.
#[derive(Debug, Clone, Serialize)]
pub struct TasksByStatus {
    pub tasks: Vec<Task>,
    pub summary: TaskSummary,
}

/// Domain service trait for tasks.
///
/// Visibility: admins see every task, team leaders the tasks assigned into
/// the departments they oversee, employees only their own. A task the caller
/// cannot see is reported as missing.
#[async_trait::async_trait]
pub trait TaskService: Send + Sync {
    async fn list(&self, principal: &Principal) -> Result<Vec<Task>, ServiceError>;

    async fn get(&self, principal: &Principal, id: TaskId) -> Result<Task, ServiceError>;

    /// Team leaders and admins only. The caller becomes the assigner.
    async fn create(&self, principal: &Principal, draft: TaskDraft) -> Result<Task, ServiceError>;

    async fn update(
        &self,
        principal: &Principal,
        id: TaskId,
        update: TaskUpdate,
    ) -> Result<Task, ServiceError>;

    /// Sets progress, recomputes status and optionally replaces the
    /// documentation.
    async fn update_progress(
        &self,
        principal: &Principal,
        id: TaskId,
        progress: Progress,
        documentation: Option<String>,
    ) -> Result<Task, ServiceError>;

    /// Only the user who assigned the task may delete it.
    async fn delete(&self, principal: &Principal, id: TaskId) -> Result<(), ServiceError>;

    async fn by_status(
        &self,
        principal: &Principal,
        status: Option<TaskStatus>,
    ) -> Result<TasksByStatus, ServiceError>;
}
