/// Persistence layer over PostgreSQL.
pub mod courses;
pub mod users;
