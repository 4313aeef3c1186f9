//! Domain service for authentication.
//!
//! Handles login, bearer token verification, logout, and the login session
//! history.

use serde::Serialize;
use thiserror::Error;

use crate::domain::Principal;
use crate::models::session::{ClientInfo, LoginSession};
use crate::models::user::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Token is missing")]
    TokenMissing,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    /// The token was valid but its user no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// The token was valid but its user has since been deactivated.
    #[error("User account is inactive")]
    UserInactive,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine readable code sent alongside the message.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidCredentials => Some("invalid_credentials"),
            Self::AccountInactive => Some("account_inactive"),
            Self::TokenMissing => Some("token_missing"),
            Self::TokenExpired => Some("token_expired"),
            Self::TokenInvalid => Some("token_invalid"),
            Self::UserNotFound => Some("user_not_found"),
            Self::UserInactive => Some("user_inactive"),
            Self::Database(_) | Self::Internal(_) => None,
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Successful login: a signed token, the sanitized user and the landing page.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
    pub redirect: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, rotates the user's login sessions and issues a
    /// token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password, and [`AuthError::AccountInactive`] for a deactivated
    /// account.
    async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token to the current state of its user.
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;

    /// Closes every active session of the caller.
    async fn logout(&self, principal: &Principal) -> Result<(), AuthError>;

    /// Admins see the latest sessions of everyone, others only their own.
    async fn list_sessions(&self, principal: &Principal) -> Result<Vec<LoginSession>, AuthError>;
}
