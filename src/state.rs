use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CourseService, DashboardService, NotificationService, SeaOrmAuthService,
    SeaOrmCourseService, SeaOrmDashboardService, SeaOrmNotificationService, SeaOrmTaskService,
    SeaOrmUserService, TaskService, TokenIssuer, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    /// Built once at startup and never mutated.
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub task_service: Arc<dyn TaskService>,

    pub course_service: Arc<dyn CourseService>,

    pub notification_service: Arc<dyn NotificationService>,

    pub dashboard_service: Arc<dyn DashboardService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires every service over an already opened store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let issuer = TokenIssuer::new(&config.security.jwt_secret, config.security.token_ttl_hours);

        let auth_service =
            Arc::new(SeaOrmAuthService::new(store.clone(), issuer)) as Arc<dyn AuthService>;
        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService>;
        let task_service = Arc::new(SeaOrmTaskService::new(store.clone(), config.access.clone()))
            as Arc<dyn TaskService>;
        let course_service =
            Arc::new(SeaOrmCourseService::new(store.clone())) as Arc<dyn CourseService>;
        let notification_service = Arc::new(SeaOrmNotificationService::new(store.clone()))
            as Arc<dyn NotificationService>;
        let dashboard_service =
            Arc::new(SeaOrmDashboardService::new(store.clone())) as Arc<dyn DashboardService>;

        Self {
            config: Arc::new(config),
            store,
            auth_service,
            user_service,
            task_service,
            course_service,
            notification_service,
            dashboard_service,
        }
    }
}
