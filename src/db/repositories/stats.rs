use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::{Department, Role, TaskStatus};
use crate::entities::{courses, tasks, users};

/// One labelled slice of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub name: String,
    pub value: u64,
}

/// Read-only aggregate queries backing the dashboards.
pub struct StatsRepository {
    conn: DatabaseConnection,
}

fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

impl StatsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn user_counts(&self) -> Result<(u64, u64)> {
        let total = users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;
        let active = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count active users")?;
        Ok((total, active))
    }

    pub async fn users_by_department(&self) -> Result<HashMap<Department, u64>> {
        let rows = users::Entity::find()
            .select_only()
            .column(users::Column::Department)
            .column_as(users::Column::Id.count(), "value")
            .group_by(users::Column::Department)
            .into_tuple::<(Department, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to group users by department")?;

        Ok(rows.into_iter().map(|(d, c)| (d, to_u64(c))).collect())
    }

    pub async fn users_by_role(&self) -> Result<HashMap<Role, u64>> {
        let rows = users::Entity::find()
            .select_only()
            .column(users::Column::Role)
            .column_as(users::Column::Id.count(), "value")
            .group_by(users::Column::Role)
            .into_tuple::<(Role, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to group users by role")?;

        Ok(rows.into_iter().map(|(r, c)| (r, to_u64(c))).collect())
    }

    pub async fn tasks_by_status(&self) -> Result<HashMap<TaskStatus, u64>> {
        let rows = tasks::Entity::find()
            .select_only()
            .column(tasks::Column::Status)
            .column_as(tasks::Column::Id.count(), "value")
            .group_by(tasks::Column::Status)
            .into_tuple::<(TaskStatus, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to group tasks by status")?;

        Ok(rows.into_iter().map(|(s, c)| (s, to_u64(c))).collect())
    }

    pub async fn course_count(&self) -> Result<u64> {
        courses::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count courses")
    }
}
