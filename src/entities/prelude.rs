pub use super::course_enrollments::Entity as CourseEnrollments;
pub use super::course_watch_history::Entity as CourseWatchHistory;
pub use super::courses::Entity as Courses;
pub use super::login_sessions::Entity as LoginSessions;
pub use super::notifications::Entity as Notifications;
pub use super::tasks::Entity as Tasks;
pub use super::users::Entity as Users;
