pub mod course;
pub mod notification;
pub mod session;
pub mod task;
pub mod user;
