use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use hrdesk::api::AppState;
use hrdesk::config::Config;
use hrdesk::entities::course_watch_history;
use hrdesk::services::TokenIssuer;
use http_body_util::BodyExt;
use sea_orm::{EntityTrait, sea_query::Expr};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

/// Bootstrap admin seeded by the initial migrations.
const ADMIN_EMAIL: &str = "admin@company.com";
const ADMIN_PASSWORD: &str = "password123";

const TEST_SECRET: &str = "integration-test-secret";

fn test_config() -> Config {
    let db_path = std::env::temp_dir().join(format!("hrdesk-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app_with_state() -> (Router, Arc<AppState>) {
    let state = hrdesk::api::create_app_state_from_config(test_config(), None)
        .await
        .expect("Failed to create app state");
    (hrdesk::api::router(state.clone()), state)
}

async fn spawn_app() -> Router {
    spawn_app_with_state().await.0
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed for {email}: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

/// Creates an account through the admin API and returns its id.
async fn create_user(
    app: &Router,
    admin: &str,
    email: &str,
    role: &str,
    department: &str,
) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/users",
        Some(admin),
        Some(json!({
            "name": email.split('@').next().unwrap(),
            "email": email,
            "password": "Password1!",
            "role": role,
            "department": department,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
    body["id"].as_i64().unwrap()
}

async fn create_task(app: &Router, token: &str, assignee: i64, title: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/tasks",
        Some(token),
        Some(json!({ "title": title, "assignedTo": assignee, "deadline": "2026-12-01" })),
    )
    .await
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
    assert_eq!(body["code"], "invalid_credentials");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@company.com", "password": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Missing email or password" }));
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_missing");

    let (status, body) = send(&app, "GET", "/api/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_invalid");

    let token = admin_token(&app).await;
    let (status, body) = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], "Admin");
}

#[tokio::test]
async fn test_admin_creates_user_and_user_can_log_in() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({
            "name": "A",
            "email": "a@x.com",
            "password": "Password1!",
            "role": "Employee",
            "department": "IT",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "a@x.com");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "Password1!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], "/employee");

    let claims = TokenIssuer::new(TEST_SECRET, 24)
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.role, hrdesk::domain::Role::Employee);
    assert_eq!(i64::from(claims.user_id), body["user"]["id"].as_i64().unwrap());

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({
            "name": "Again",
            "email": "a@x.com",
            "password": "Password1!",
            "role": "Employee",
            "department": "IT",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({ "name": "NoEmail", "password": "Password1!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");
}

#[tokio::test]
async fn test_employee_cannot_create_users() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "emp@company.com", "Employee", "IT").await;
    let employee = login(&app, "emp@company.com", "Password1!").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(&employee),
        Some(json!({
            "name": "Sneaky",
            "email": "sneaky@company.com",
            "password": "Password1!",
            "role": "Admin",
            "department": "IT",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/users", Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_last_admin_cannot_be_deleted() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, me) = send(&app, "GET", "/api/users/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let admin_id = me["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/users/{admin_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete the last admin user");

    let second = create_user(&app, &admin, "admin2@company.com", "Admin", "IT").await;
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{second}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/users/{second}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_last_team_leader_cannot_delete_own_account() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "lead@company.com", "TeamLeader", "Finance").await;
    let lead = login(&app, "lead@company.com", "Password1!").await;

    let (status, body) = send(&app, "DELETE", "/api/team-leader/account", Some(&lead), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot delete the last team leader of the department"
    );

    create_user(&app, &admin, "lead2@company.com", "TeamLeader", "Finance").await;
    let (status, _) = send(&app, "DELETE", "/api/team-leader/account", Some(&lead), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_logins_leave_one_active_session() {
    let app = spawn_app().await;

    let mut token = String::new();
    for _ in 0..3 {
        token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    }

    let (status, body) = send(&app, "GET", "/api/login-sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 3);
    let active = sessions
        .iter()
        .filter(|s| s["isActive"] == json!(true))
        .count();
    assert_eq!(active, 1);

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/login-sessions", Some(&token), None).await;
    assert!(
        body.as_array()
            .unwrap()
            .iter()
            .all(|s| s["isActive"] == json!(false))
    );
}

#[tokio::test]
async fn test_team_leader_cannot_assign_outside_department() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "fin.lead@company.com", "TeamLeader", "Finance").await;
    let sales_rep = create_user(&app, &admin, "rep@company.com", "Employee", "Sales").await;
    let lead = login(&app, "fin.lead@company.com", "Password1!").await;

    let (status, _) = create_task(&app, &lead, sales_rep, "Cross department").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/tasks", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = create_task(&app, &lead, 9999, "Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employee_progress_update_derives_status() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "it.lead@company.com", "TeamLeader", "IT").await;
    let dev = create_user(&app, &admin, "dev@company.com", "Employee", "IT").await;
    let lead = login(&app, "it.lead@company.com", "Password1!").await;
    let employee = login(&app, "dev@company.com", "Password1!").await;

    let (status, task) = create_task(&app, &lead, dev, "Ship feature").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "Todo");
    let task_id = task["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}"),
        Some(&employee),
        Some(json!({ "progress": 95 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"], 95);
    assert_eq!(body["status"], "Completed");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}"),
        Some(&employee),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}/progress"),
        Some(&employee),
        Some(json!({ "progress": 60, "documentation": "Half way" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "In Progress");
    assert_eq!(body["documentation"], "Half way");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}/progress"),
        Some(&employee),
        Some(json!({ "progress": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Progress must be an integer between 0 and 100");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/tasks/{task_id}"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/tasks/{task_id}"),
        Some(&lead),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_task_visibility_by_role() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let alice = create_user(&app, &admin, "alice@company.com", "Employee", "Sales").await;
    let bob = create_user(&app, &admin, "bob@company.com", "Employee", "Customer-Service").await;
    create_user(&app, &admin, "sales.lead@company.com", "TeamLeader", "Sales").await;
    create_user(&app, &admin, "fin.lead@company.com", "TeamLeader", "Finance").await;

    let (status, _) = create_task(&app, &admin, alice, "Call client").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, bob_task) = create_task(&app, &admin, bob, "Answer tickets").await;
    assert_eq!(status, StatusCode::CREATED);
    let bob_task = bob_task["id"].as_i64().unwrap();

    let employee = login(&app, "alice@company.com", "Password1!").await;
    let (_, body) = send(&app, "GET", "/api/tasks", Some(&employee), None).await;
    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(tasks.iter().all(|t| t["assignedTo"] == json!(alice)));

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/tasks/{bob_task}"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let sales_lead = login(&app, "sales.lead@company.com", "Password1!").await;
    let (_, body) = send(&app, "GET", "/api/tasks", Some(&sales_lead), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let fin_lead = login(&app, "fin.lead@company.com", "Password1!").await;
    let (_, body) = send(&app, "GET", "/api/tasks", Some(&fin_lead), None).await;
    assert_eq!(body, json!([]));

    let (status, body) = send(
        &app,
        "GET",
        "/api/tasks/by-status?status=Todo",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["summary"]["todo"], 2);

    let (status, _) = send(
        &app,
        "GET",
        "/api/tasks/by-status?status=Done",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_self_update_ignores_privileged_fields() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let id = create_user(&app, &admin, "self@company.com", "Employee", "IT").await;
    let employee = login(&app, "self@company.com", "Password1!").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(&employee),
        Some(json!({ "role": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No valid fields to update");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(&employee),
        Some(json!({ "name": "Self Made", "role": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Self Made");
    assert_eq!(body["role"], "Employee");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(&admin),
        Some(json!({ "experienceLevel": "lots" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid value for field: experienceLevel");
}

#[tokio::test]
async fn test_password_change_rules() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let id = create_user(&app, &admin, "pw@company.com", "Employee", "IT").await;
    let employee = login(&app, "pw@company.com", "Password1!").await;
    let uri = format!("/api/users/{id}/password");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&employee),
        Some(json!({ "currentPassword": "Password1!", "newPassword": "weak" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&employee),
        Some(json!({ "currentPassword": "Wrong1!aa", "newPassword": "Stronger2@" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&employee),
        Some(json!({ "currentPassword": "Password1!", "newPassword": "Stronger2@" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login(&app, "pw@company.com", "Stronger2@").await;

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({ "currentPassword": "x", "newPassword": "Stronger3#" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/reset-password/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newPassword"], "password123");
    login(&app, "pw@company.com", "password123").await;
}

#[tokio::test]
async fn test_course_watch_progress_is_monotonic() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "learner@company.com", "Employee", "IT").await;
    create_user(&app, &admin, "outsider@company.com", "Employee", "Finance").await;
    let learner = login(&app, "learner@company.com", "Password1!").await;

    let (status, course) = send(
        &app,
        "POST",
        "/api/courses",
        Some(&admin),
        Some(json!({ "title": "Rust basics", "department": "IT", "segmentCount": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let course_id = course["id"].as_i64().unwrap();
    let watch_uri = format!("/api/courses/{course_id}/watch");

    let (status, body) = send(
        &app,
        "POST",
        &watch_uri,
        Some(&learner),
        Some(json!({ "duration": 120, "position": 240, "completedSegments": [0, 1, 1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["progress"], 50);
    assert_eq!(body["today"]["completedSegments"], json!([0, 1]));

    let (status, body) = send(
        &app,
        "POST",
        &watch_uri,
        Some(&learner),
        Some(json!({ "duration": 30, "position": 60, "completedSegments": [0] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["progress"], 50);
    assert_eq!(body["today"]["watchDuration"], 150);

    let (status, body) = send(
        &app,
        "POST",
        &watch_uri,
        Some(&learner),
        Some(json!({ "duration": -5, "position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/courses/{course_id}/watch-history"),
        Some(&learner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/courses", Some(&learner), None).await;
    assert_eq!(body[0]["enrolledUsers"], 1);

    let outsider = login(&app, "outsider@company.com", "Password1!").await;
    let (_, body) = send(&app, "GET", "/api/courses", Some(&outsider), None).await;
    assert_eq!(body, json!([]));
    let (status, _) = send(
        &app,
        "POST",
        &watch_uri,
        Some(&outsider),
        Some(json!({ "duration": 10, "position": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_notifications_are_department_scoped() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "hr.lead@company.com", "TeamLeader", "Finance").await;
    create_user(&app, &admin, "fin@company.com", "Employee", "Finance").await;
    create_user(&app, &admin, "it@company.com", "Employee", "IT").await;
    let lead = login(&app, "hr.lead@company.com", "Password1!").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/notifications",
        Some(&lead),
        Some(json!({ "title": "Audit", "message": "Prepare files", "department": "IT" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = send(
        &app,
        "POST",
        "/api/notifications",
        Some(&lead),
        Some(json!({ "title": "Audit", "message": "Prepare files", "type": "task" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "task");
    assert_eq!(created["department"], "Finance");

    let finance = login(&app, "fin@company.com", "Password1!").await;
    let (_, body) = send(&app, "GET", "/api/notifications", Some(&finance), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let it = login(&app, "it@company.com", "Password1!").await;
    let (_, body) = send(&app, "GET", "/api/notifications", Some(&it), None).await;
    assert_eq!(body, json!([]));

    let id = created["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/notifications/{id}"),
        Some(&finance),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/notifications/{id}"),
        Some(&lead),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dashboards_are_role_gated() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let worker = create_user(&app, &admin, "worker@company.com", "Employee", "Sales").await;
    create_user(&app, &admin, "boss@company.com", "TeamLeader", "Sales").await;
    create_task(&app, &admin, worker, "Prospect").await;

    let (status, body) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalUsers"], 3);
    assert_eq!(body["totalTasks"], 1);
    assert_eq!(body["activeSessions"], 1);
    assert_eq!(body["roleStats"][1], json!({ "name": "Team Leaders", "value": 1 }));

    let boss = login(&app, "boss@company.com", "Password1!").await;
    let (status, body) = send(&app, "GET", "/api/team-leader/dashboard", Some(&boss), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department"], "Sales");
    assert_eq!(body["teamMembers"]["total"], 1);
    assert_eq!(body["tasks"]["todo"], 1);
    assert_eq!(body["performance"]["bestPerformer"]["email"], "worker@company.com");

    let (status, _) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&boss), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let employee = login(&app, "worker@company.com", "Password1!").await;
    let (status, body) = send(&app, "GET", "/api/employee/dashboard", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"]["total"], 1);
    assert_eq!(body["tasks"]["upcoming"][0]["title"], "Prospect");
    assert_eq!(body["courses"]["enrolled"], 0);

    let (status, _) = send(&app, "GET", "/api/metrics", Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

async fn create_course(app: &Router, token: &str, department: &str, segments: i32) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/courses",
        Some(token),
        Some(json!({ "title": "Onboarding", "department": department, "segmentCount": segments })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create course failed: {body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_watch_reports_accumulate() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "viewer@company.com", "Employee", "IT").await;
    let viewer = login(&app, "viewer@company.com", "Password1!").await;
    let course_id = create_course(&app, &admin, "IT", 10).await;
    let uri = format!("/api/courses/{course_id}/watch");

    let reports = (0..8).map(|_| {
        let app = app.clone();
        let token = viewer.clone();
        let uri = uri.clone();
        tokio::spawn(async move {
            send(
                &app,
                "POST",
                &uri,
                Some(&token),
                Some(json!({ "duration": 10, "position": 10 })),
            )
            .await
            .0
        })
    });
    let statuses: Vec<StatusCode> = futures::future::join_all(reports)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    assert!(
        statuses.iter().all(|s| *s == StatusCode::OK),
        "{statuses:?}"
    );

    let (_, history) = send(
        &app,
        "GET",
        &format!("/api/courses/{course_id}/watch-history"),
        Some(&viewer),
        None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["watchDuration"], 80);

    let (_, courses) = send(&app, "GET", "/api/courses", Some(&viewer), None).await;
    assert_eq!(courses[0]["enrolledUsers"], 1);
}

#[tokio::test]
async fn test_course_progress_counts_segments_across_days() {
    let (app, state) = spawn_app_with_state().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "it.lead@company.com", "TeamLeader", "IT").await;
    let learner_id = create_user(&app, &admin, "learner@company.com", "Employee", "IT").await;
    let learner = login(&app, "learner@company.com", "Password1!").await;
    let course_id = create_course(&app, &admin, "IT", 4).await;
    let watch_uri = format!("/api/courses/{course_id}/watch");

    let (_, body) = send(
        &app,
        "POST",
        &watch_uri,
        Some(&learner),
        Some(json!({ "duration": 100, "position": 50, "completedSegments": [0, 1] })),
    )
    .await;
    assert_eq!(body["enrollment"]["progress"], 50);

    course_watch_history::Entity::update_many()
        .col_expr(
            course_watch_history::Column::WatchDate,
            Expr::value("2000-01-01"),
        )
        .exec(&state.store().conn)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &watch_uri,
        Some(&learner),
        Some(json!({ "duration": 40, "position": 90, "completedSegments": [2, 3] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["progress"], 100);
    assert_eq!(body["enrollment"]["completed"], true);

    let (_, history) = send(
        &app,
        "GET",
        &format!("/api/courses/{course_id}/watch-history"),
        Some(&learner),
        None,
    )
    .await;
    let days = history.as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_ne!(days[0]["watchDate"], "2000-01-01");
    assert_eq!(days[1]["watchDate"], "2000-01-01");

    let lead = login(&app, "it.lead@company.com", "Password1!").await;
    let (status, rows) = send(
        &app,
        "GET",
        "/api/team-leader/course-progress",
        Some(&lead),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["userId"], learner_id);
    assert_eq!(rows[0]["totalWatchSeconds"], 140);
    assert_eq!(rows[0]["daysWatched"], 2);
    assert_eq!(rows[0]["progress"], 100);

    let (status, _) = send(
        &app,
        "GET",
        "/api/team-leader/course-progress",
        Some(&learner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_enroll_is_idempotent() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_user(&app, &admin, "student@company.com", "Employee", "Finance").await;
    create_user(&app, &admin, "stranger@company.com", "Employee", "Sales").await;
    let student = login(&app, "student@company.com", "Password1!").await;
    let course_id = create_course(&app, &admin, "Finance", 10).await;
    let uri = format!("/api/courses/{course_id}/enroll");

    for _ in 0..2 {
        let (status, body) = send(&app, "POST", &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["courseId"], course_id);
        assert_eq!(body["progress"], 0);
    }

    let (_, courses) = send(&app, "GET", "/api/courses", Some(&student), None).await;
    assert_eq!(courses[0]["enrolledUsers"], 1);

    let stranger = login(&app, "stranger@company.com", "Password1!").await;
    let (status, _) = send(&app, "POST", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_writes_outside_scope_are_forbidden() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let sales_lead_id = create_user(&app, &admin, "sales.lead@company.com", "TeamLeader", "Sales").await;
    create_user(&app, &admin, "sales.lead2@company.com", "TeamLeader", "Sales").await;
    create_user(&app, &admin, "fin.lead@company.com", "TeamLeader", "Finance").await;
    let rep = create_user(&app, &admin, "rep@company.com", "Employee", "Sales").await;
    create_user(&app, &admin, "other@company.com", "Employee", "Sales").await;
    let agent = create_user(&app, &admin, "agent@company.com", "Employee", "Customer-Service").await;

    let sales_lead = login(&app, "sales.lead@company.com", "Password1!").await;
    let (status, task) = create_task(&app, &sales_lead, rep, "Quarterly pipeline").await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_i64().unwrap();
    let task_uri = format!("/api/tasks/{task_id}");

    // Sales leads also oversee Customer-Service.
    let (status, support_task) = create_task(&app, &sales_lead, agent, "Escalations").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{}", support_task["id"]),
        Some(&sales_lead),
        Some(json!({ "progress": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"], 40);

    let fin_lead = login(&app, "fin.lead@company.com", "Password1!").await;
    let (status, body) = send(
        &app,
        "PUT",
        &task_uri,
        Some(&fin_lead),
        Some(json!({ "progress": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    let (status, _) = send(
        &app,
        "PUT",
        &format!("{task_uri}/progress"),
        Some(&fin_lead),
        Some(json!({ "progress": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &task_uri, Some(&fin_lead), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "GET", &task_uri, Some(&fin_lead), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let other = login(&app, "other@company.com", "Password1!").await;
    let (status, _) = send(
        &app,
        "PUT",
        &task_uri,
        Some(&other),
        Some(json!({ "progress": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let second_lead = login(&app, "sales.lead2@company.com", "Password1!").await;
    let (status, _) = send(&app, "DELETE", &task_uri, Some(&second_lead), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{sales_lead_id}"),
        Some(&admin),
        Some(json!({ "role": "Employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &task_uri, Some(&sales_lead), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", &task_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_tasks_by_status_summary_averages_progress() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let worker = create_user(&app, &admin, "worker@company.com", "Employee", "IT").await;

    for (title, progress) in [("Draft", 20), ("Review", 60)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&admin),
            Some(json!({ "title": title, "assignedTo": worker, "progress": progress })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/tasks/by-status", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["summary"]["todo"], 1);
    assert_eq!(body["summary"]["inProgress"], 1);
    assert_eq!(body["summary"]["averageProgress"], json!(40.0));
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_envelope() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let request = Request::builder()
        .uri("/api/tasks/abc")
        .header("Authorization", format!("Bearer {admin}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"],
        mime::APPLICATION_JSON.as_ref()
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

    let (status, body) = send(&app, "DELETE", "/api/users/x1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(
        &app,
        "GET",
        "/api/tasks/by-status?status=Todo&status=Completed",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_last_active_admin_cannot_be_deactivated() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let (_, me) = send(&app, "GET", "/api/users/me", Some(&admin), None).await;
    let admin_id = me["id"].as_i64().unwrap();
    let deactivate = Some(json!({ "isActive": false }));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{admin_id}"),
        Some(&admin),
        deactivate.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot remove the last admin user");

    let second = create_user(&app, &admin, "admin2@company.com", "Admin", "Finance").await;
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{second}"),
        Some(&admin),
        deactivate.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{admin_id}"),
        Some(&admin),
        deactivate,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleted_team_leader_hands_over_assigned_tasks() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let (_, me) = send(&app, "GET", "/api/users/me", Some(&admin), None).await;
    let admin_id = me["id"].as_i64().unwrap();
    create_user(&app, &admin, "first.lead@company.com", "TeamLeader", "Sales").await;
    let second_id = create_user(&app, &admin, "second.lead@company.com", "TeamLeader", "Sales").await;
    let rep = create_user(&app, &admin, "rep@company.com", "Employee", "Sales").await;

    let first = login(&app, "first.lead@company.com", "Password1!").await;
    let (_, task) = create_task(&app, &first, rep, "Renewals").await;
    let task_uri = format!("/api/tasks/{}", task["id"]);

    let (status, _) = send(&app, "DELETE", "/api/team-leader/account", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &task_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedBy"], second_id);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{second_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &task_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedBy"], admin_id);
}
