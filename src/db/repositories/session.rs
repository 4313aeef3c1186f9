use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};

use crate::domain::UserId;
use crate::entities::{login_sessions, users};
use crate::models::session::{ClientInfo, LoginSession};

pub struct SessionRepository {
    conn: DatabaseConnection,
}

fn to_session(session: login_sessions::Model, user: Option<users::Model>) -> LoginSession {
    LoginSession {
        id: session.id,
        user_id: UserId::new(session.user_id),
        user_agent: session.user_agent,
        ip_address: session.ip_address,
        login_time: session.login_time,
        logout_time: session.logout_time,
        is_active: session.is_active,
        user_name: user.as_ref().map(|u| u.name.clone()),
        email: user.map(|u| u.email),
    }
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Deactivates every session of the user and opens a new one, atomically.
    pub async fn rotate(&self, user_id: UserId, client: ClientInfo) -> Result<LoginSession> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin session transaction")?;

        let now = crate::db::timestamp();

        login_sessions::Entity::update_many()
            .col_expr(login_sessions::Column::IsActive, Expr::value(false))
            .col_expr(login_sessions::Column::LogoutTime, Expr::value(now.clone()))
            .filter(login_sessions::Column::UserId.eq(user_id.value()))
            .filter(login_sessions::Column::IsActive.eq(true))
            .exec(&txn)
            .await
            .context("Failed to deactivate previous sessions")?;

        let session = login_sessions::ActiveModel {
            user_id: Set(user_id.value()),
            user_agent: Set(client.user_agent),
            ip_address: Set(client.ip_address),
            login_time: Set(now),
            logout_time: Set(None),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert login session")?;

        txn.commit()
            .await
            .context("Failed to commit session transaction")?;

        Ok(to_session(session, None))
    }

    /// Closes all active sessions of the user. Returns how many were closed.
    pub async fn deactivate_all(&self, user_id: UserId) -> Result<u64> {
        let result = login_sessions::Entity::update_many()
            .col_expr(login_sessions::Column::IsActive, Expr::value(false))
            .col_expr(
                login_sessions::Column::LogoutTime,
                Expr::value(crate::db::timestamp()),
            )
            .filter(login_sessions::Column::UserId.eq(user_id.value()))
            .filter(login_sessions::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to deactivate sessions")?;

        Ok(result.rows_affected)
    }

    /// Most recent sessions first, optionally restricted to one user.
    pub async fn list_recent(&self, user: Option<UserId>, limit: u64) -> Result<Vec<LoginSession>> {
        let mut query = login_sessions::Entity::find().find_also_related(users::Entity);
        if let Some(user_id) = user {
            query = query.filter(login_sessions::Column::UserId.eq(user_id.value()));
        }

        let rows = query
            .order_by_desc(login_sessions::Column::LoginTime)
            .order_by_desc(login_sessions::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list login sessions")?;

        Ok(rows
            .into_iter()
            .map(|(session, user)| to_session(session, user))
            .collect())
    }

    pub async fn count_active(&self) -> Result<u64> {
        login_sessions::Entity::find()
            .filter(login_sessions::Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count active sessions")
    }
}
