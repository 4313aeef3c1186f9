use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CourseService, DashboardService, NotificationService, TaskService, UserService,
};
use crate::state::SharedState;

pub mod auth;
mod courses;
mod dashboard;
mod error;
mod notifications;
mod observability;
mod system;
mod tasks;
mod team_leader;
pub mod types;
mod users;
mod validation;

pub use error::{ApiError, ErrorBody};

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn task_service(&self) -> &Arc<dyn TaskService> {
        &self.shared.task_service
    }

    #[must_use]
    pub fn course_service(&self) -> &Arc<dyn CourseService> {
        &self.shared.course_service
    }

    #[must_use]
    pub fn notification_service(&self) -> &Arc<dyn NotificationService> {
        &self.shared.notification_service
    }

    #[must_use]
    pub fn dashboard_service(&self) -> &Arc<dyn DashboardService> {
        &self.shared.dashboard_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        // Users
        .route("/users/me", get(users::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/password", put(users::update_password))
        .route("/users/reset-password/{id}", post(users::reset_password))
        // Tasks
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/by-status", get(tasks::tasks_by_status))
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{id}/progress", put(tasks::update_progress))
        // Courses
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/courses/{id}/enroll", post(courses::enroll))
        .route("/courses/{id}/watch", post(courses::record_watch))
        .route("/courses/{id}/watch-history", get(courses::watch_history))
        // Notifications
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/notifications/{id}",
            delete(notifications::delete_notification),
        )
        // Sessions and dashboards
        .route("/login-sessions", get(dashboard::login_sessions))
        .route("/admin/dashboard-stats", get(dashboard::admin_stats))
        .route("/employee/dashboard", get(dashboard::employee))
        // Team leader
        .route("/team-leader/dashboard", get(dashboard::team_leader))
        .route(
            "/team-leader/course-progress",
            get(courses::team_course_progress),
        )
        .route("/team-leader/profile", put(team_leader::update_profile))
        .route("/team-leader/password", put(team_leader::update_password))
        .route("/team-leader/account", delete(team_leader::delete_account))
        // Observability
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
