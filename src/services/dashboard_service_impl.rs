//! `SeaORM` implementation of the `DashboardService` trait.

use async_trait::async_trait;
use sea_orm::Iterable;
use std::collections::HashMap;

use crate::db::{Breakdown, Store, TaskScope};
use crate::domain::scoring::{mean_progress, overall_rating, rate};
use crate::domain::{Department, Principal, Role, TaskStatus, UserId};
use crate::models::task::{Task, TaskSummary};
use crate::models::user::User;
use crate::services::dashboard_service::{
    AdminDashboard, CourseCatalog, DashboardService, EmployeeCourses, EmployeeDashboard,
    EmployeeTasks, MemberPerformance, Performance, Roster, TaskBoard, TeamLeaderDashboard,
};
use crate::services::error::ServiceError;

const RECENT_SESSIONS: u64 = 5;
const UPCOMING_TASKS: usize = 5;

pub struct SeaOrmDashboardService {
    store: Store,
}

impl SeaOrmDashboardService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

const fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admins",
        Role::TeamLeader => "Team Leaders",
        Role::Employee => "Employees",
    }
}

fn breakdown<K: Copy + Eq + std::hash::Hash>(
    keys: impl IntoIterator<Item = K>,
    counts: &HashMap<K, u64>,
    label: impl Fn(K) -> String,
) -> Vec<Breakdown> {
    keys.into_iter()
        .map(|key| Breakdown {
            name: label(key),
            value: counts.get(&key).copied().unwrap_or(0),
        })
        .collect()
}

/// Scores every member on task completion and course enrollment, best first.
/// Ties keep roster order.
pub(crate) fn rank_members(
    members: &[User],
    tasks: &[Task],
    enrollments: &HashMap<UserId, u64>,
    department_courses: u64,
) -> Performance {
    let mut metrics: Vec<MemberPerformance> = members
        .iter()
        .map(|member| {
            let assigned = tasks.iter().filter(|t| t.assigned_to == member.id);
            let total_tasks = assigned.clone().count() as u64;
            let completed_tasks = assigned
                .filter(|t| t.status == TaskStatus::Completed)
                .count() as u64;
            let enrolled_courses = enrollments.get(&member.id).copied().unwrap_or(0);

            let task_completion_rate = rate(completed_tasks, total_tasks);
            let course_enrollment_rate = rate(enrolled_courses, department_courses);

            MemberPerformance {
                user_id: member.id,
                name: member.name.clone(),
                email: member.email.clone(),
                total_tasks,
                completed_tasks,
                task_completion_rate,
                enrolled_courses,
                course_enrollment_rate,
                overall_rating: overall_rating(task_completion_rate, course_enrollment_rate),
            }
        })
        .collect();

    metrics.sort_by(|a, b| b.overall_rating.total_cmp(&a.overall_rating));

    Performance {
        best_performer: metrics.first().cloned(),
        worst_performer: metrics.last().cloned(),
        metrics,
    }
}

/// Incomplete tasks ordered by deadline. Tasks without a deadline come last.
fn upcoming(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut pending: Vec<Task> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Completed)
        .cloned()
        .collect();
    pending.sort_by(|a, b| {
        (a.deadline.is_none(), &a.deadline).cmp(&(b.deadline.is_none(), &b.deadline))
    });
    pending.truncate(limit);
    pending
}

#[async_trait]
impl DashboardService for SeaOrmDashboardService {
    async fn admin(&self, principal: &Principal) -> Result<AdminDashboard, ServiceError> {
        if !principal.is_admin() {
            return Err(ServiceError::forbidden("Admin access required"));
        }

        let stats = self.store.stats();
        let sessions = self.store.sessions();

        let ((total_users, active_users), by_department, by_role, by_status, total_courses) =
            futures::try_join!(
                stats.user_counts(),
                stats.users_by_department(),
                stats.users_by_role(),
                stats.tasks_by_status(),
                stats.course_count(),
            )?;
        let (active_sessions, recent_sessions) = futures::try_join!(
            sessions.count_active(),
            sessions.list_recent(None, RECENT_SESSIONS),
        )?;

        Ok(AdminDashboard {
            total_users,
            active_users,
            total_tasks: by_status.values().sum(),
            completed_tasks: by_status.get(&TaskStatus::Completed).copied().unwrap_or(0),
            total_courses,
            active_sessions,
            department_stats: breakdown(Department::iter(), &by_department, |d| d.to_string()),
            task_stats: breakdown(TaskStatus::ALL, &by_status, |s| s.to_string()),
            role_stats: breakdown(Role::iter(), &by_role, |r| role_label(r).to_string()),
            recent_sessions,
        })
    }

    async fn team_leader(
        &self,
        principal: &Principal,
    ) -> Result<TeamLeaderDashboard, ServiceError> {
        if !principal.is_team_leader() {
            return Err(ServiceError::forbidden("Team leader access required"));
        }
        let department = principal.department;

        let members = self
            .store
            .users()
            .list_by_department_and_role(department, Role::Employee)
            .await?;
        let tasks = self
            .store
            .tasks()
            .list(&TaskScope::Departments(vec![department]), None)
            .await?;
        let courses = self.store.courses().list(Some(department)).await?;
        let enrollments = self
            .store
            .courses()
            .department_enrollment_counts(department)
            .await?;

        let performance = rank_members(&members, &tasks, &enrollments, courses.len() as u64);
        let summary = TaskSummary::of(&tasks);

        Ok(TeamLeaderDashboard {
            department,
            team_members: Roster {
                total: members.len(),
                list: members,
            },
            tasks: TaskBoard {
                total: summary.total,
                completed: summary.completed,
                in_progress: summary.in_progress,
                todo: summary.todo,
                list: tasks,
            },
            courses: CourseCatalog {
                total: courses.len(),
                list: courses,
            },
            performance,
        })
    }

    async fn employee(&self, principal: &Principal) -> Result<EmployeeDashboard, ServiceError> {
        if !principal.is_employee() {
            return Err(ServiceError::forbidden("Employee access required"));
        }

        let tasks = self
            .store
            .tasks()
            .list(&TaskScope::AssignedTo(principal.id), None)
            .await?;
        let enrollments = self.store.courses().enrollments_for(principal.id).await?;

        let summary = TaskSummary::of(&tasks);
        let course_progress: Vec<i32> = enrollments.iter().map(|e| e.progress).collect();

        Ok(EmployeeDashboard {
            tasks: EmployeeTasks {
                total: summary.total,
                completed: summary.completed,
                in_progress: summary.in_progress,
                todo: summary.todo,
                average_progress: summary.average_progress,
                upcoming: upcoming(&tasks, UPCOMING_TASKS),
            },
            courses: EmployeeCourses {
                enrolled: enrollments.len(),
                completed: enrollments.iter().filter(|e| e.completed).count(),
                average_progress: mean_progress(&course_progress),
                list: enrollments,
            },
        })
    }
}
