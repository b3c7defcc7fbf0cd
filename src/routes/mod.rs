mod auth;
mod courses;
mod health_check;
mod users;

pub use auth::{login, register};
pub use courses::{create_course, delete_course, enroll_course, get_course, list_courses, update_course};
pub use health_check::health_check;
pub use users::{get_me, list_users, update_me};
