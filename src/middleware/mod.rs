/// Request middleware: the access-guard wrapper and request logging.
mod auth_middleware;
mod request_logger;

pub use auth_middleware::AuthMiddleware;
pub use request_logger::RequestLogger;
