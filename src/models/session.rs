use serde::Serialize;

use crate::domain::UserId;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub id: i32,
    pub user_id: UserId,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub login_time: String,
    pub logout_time: Option<String>,
    pub is_active: bool,
    pub user_name: Option<String>,
    pub email: Option<String>,
}

/// Request metadata recorded alongside a login.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
