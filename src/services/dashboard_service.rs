//! Read-only rollups for the three role dashboards.

use serde::Serialize;

use crate::db::Breakdown;
use crate::domain::{Department, Principal, UserId};
use crate::models::course::{Course, Enrollment};
use crate::models::session::LoginSession;
use crate::models::task::Task;
use crate::models::user::User;
use crate::services::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_users: u64,
    pub active_users: u64,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub total_courses: u64,
    pub active_sessions: u64,
    pub department_stats: Vec<Breakdown>,
    pub task_stats: Vec<Breakdown>,
    pub role_stats: Vec<Breakdown>,
    pub recent_sessions: Vec<LoginSession>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub total: usize,
    pub list: Vec<User>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBoard {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub todo: usize,
    pub list: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseCatalog {
    pub total: usize,
    pub list: Vec<Course>,
}

/// One team member's standing on the performance board. Rates are
/// percentages rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPerformance {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub task_completion_rate: f64,
    pub enrolled_courses: u64,
    pub course_enrollment_rate: f64,
    pub overall_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// Ranked by overall rating, best first.
    pub metrics: Vec<MemberPerformance>,
    pub best_performer: Option<MemberPerformance>,
    pub worst_performer: Option<MemberPerformance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeaderDashboard {
    pub department: Department,
    pub team_members: Roster,
    pub tasks: TaskBoard,
    pub courses: CourseCatalog,
    pub performance: Performance,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeTasks {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub todo: usize,
    pub average_progress: f64,
    /// Next incomplete tasks, earliest deadline first.
    pub upcoming: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCourses {
    pub enrolled: usize,
    pub completed: usize,
    pub average_progress: f64,
    pub list: Vec<Enrollment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDashboard {
    pub tasks: EmployeeTasks,
    pub courses: EmployeeCourses,
}

#[async_trait::async_trait]
pub trait DashboardService: Send + Sync {
    async fn admin(&self, principal: &Principal) -> Result<AdminDashboard, ServiceError>;

    async fn team_leader(
        &self,
        principal: &Principal,
    ) -> Result<TeamLeaderDashboard, ServiceError>;

    async fn employee(&self, principal: &Principal) -> Result<EmployeeDashboard, ServiceError>;
}
