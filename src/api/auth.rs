use axum::{
    Extension, Json,
    extract::{ConnectInfo, Request, State, rejection::JsonRejection},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::types::{LoginRequest, MessageResponse};
use super::{ApiError, AppState};
use crate::domain::Principal;
use crate::models::session::ClientInfo;
use crate::services::{AuthError, LoginResult};

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>` and attaches the caller's
/// [`Principal`], freshly read from storage, to the request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::TokenMissing)?;

    let principal = state.auth_service().authenticate(token).await?;

    tracing::Span::current().record("user_id", principal.id.value());
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn client_info(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientInfo {
    let header_text = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let forwarded = header_text("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty());

    ClientInfo {
        user_agent: header_text(header::USER_AGENT.as_str()),
        ip_address: forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    connect: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResult>, ApiError> {
    let Json(payload) = payload?;

    let email = payload.email.map(|e| e.trim().to_string()).unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Missing email or password"));
    }

    let peer = connect.map(|Extension(ConnectInfo(addr))| addr);
    let result = state
        .auth_service()
        .login(&email, &password, client_info(&headers, peer))
        .await?;

    Ok(Json(result))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service().logout(&principal).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}
