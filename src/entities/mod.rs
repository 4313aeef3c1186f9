pub mod prelude;

pub mod course_enrollments;
pub mod course_watch_history;
pub mod courses;
pub mod login_sessions;
pub mod notifications;
pub mod tasks;
pub mod users;
