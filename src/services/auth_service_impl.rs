//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{Store, verify_password};
use crate::domain::{Principal, UserId};
use crate::models::session::{ClientInfo, LoginSession};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::token::TokenIssuer;

const ADMIN_SESSION_LIMIT: u64 = 50;
const OWN_SESSION_LIMIT: u64 = 10;

pub struct SeaOrmAuthService {
    store: Store,
    issuer: TokenIssuer,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> Result<LoginResult, AuthError> {
        let Some((user, hash)) = self.store.users().get_credentials(email).await? else {
            warn!(email = %email, "Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(hash, password).await? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        self.store.sessions().rotate(user.id, client).await?;
        let token = self.issuer.issue(&user)?;

        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResult {
            token,
            redirect: user.role.redirect_path().to_string(),
            user,
        })
    }

    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.issuer.verify(token)?;

        let user = self
            .store
            .users()
            .get_by_id(UserId::new(claims.user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        Ok(Principal {
            id: user.id,
            email: user.email,
            role: user.role,
            department: user.department,
        })
    }

    async fn logout(&self, principal: &Principal) -> Result<(), AuthError> {
        let closed = self.store.sessions().deactivate_all(principal.id).await?;
        info!(user_id = %principal.id, closed, "User logged out");
        Ok(())
    }

    async fn list_sessions(&self, principal: &Principal) -> Result<Vec<LoginSession>, AuthError> {
        let sessions = if principal.is_admin() {
            self.store
                .sessions()
                .list_recent(None, ADMIN_SESSION_LIMIT)
                .await?
        } else {
            self.store
                .sessions()
                .list_recent(Some(principal.id), OWN_SESSION_LIMIT)
                .await?
        };
        Ok(sessions)
    }
}
