pub mod error;
pub use error::ServiceError;

pub mod token;
pub use token::{Claims, TokenIssuer};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::UserService;
pub use user_service_impl::SeaOrmUserService;

pub mod task_service;
pub mod task_service_impl;
pub use task_service::{TaskService, TasksByStatus};
pub use task_service_impl::SeaOrmTaskService;

pub mod course_service;
pub mod course_service_impl;
pub use course_service::CourseService;
pub use course_service_impl::SeaOrmCourseService;

pub mod notification_service;
pub mod notification_service_impl;
pub use notification_service::NotificationService;
pub use notification_service_impl::SeaOrmNotificationService;

pub mod dashboard_service;
pub mod dashboard_service_impl;
pub use dashboard_service::DashboardService;
pub use dashboard_service_impl::SeaOrmDashboardService;
