/// Unified error handling for the service.
///
/// Domain-specific error enums feed a single `AppError`, which maps every
/// failure to a stable outward code and HTTP status. Authentication failures
/// (401) and authorization failures (403) stay distinguishable so a client
/// can tell "log in again" from "you lack permission" apart.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::models::Role;

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors.
///
/// Every variant carries a distinct outward code so callers can give precise
/// feedback. The first five are authentication failures (401); `RoleNotAllowed`
/// is the sole authorization failure (403).
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token in the Authorization header (absent or malformed).
    MissingToken,
    /// Token is malformed or its signature does not match the server secret.
    TokenInvalid,
    /// Token signature is valid but its expiry instant has passed.
    TokenExpired,
    /// Token is valid but its subject no longer resolves to a user.
    UserGone,
    /// Authorization was attempted without a prior authentication stage.
    /// A programming-contract violation by the integrator, not an end-user error.
    NotAuthenticated,
    /// Wrong email or password at login.
    InvalidCredentials,
    /// Authenticated, but the user's role is not in the allowlist.
    RoleNotAllowed(Role),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Access denied: no token provided"),
            AuthError::TokenInvalid => write!(f, "Invalid token: authentication failed"),
            AuthError::TokenExpired => write!(f, "Token expired: please log in again"),
            AuthError::UserGone => write!(f, "Access denied: user not found"),
            AuthError::NotAuthenticated => {
                write!(f, "Not authenticated: run the authentication stage first")
            }
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::RoleNotAllowed(role) => {
                write!(
                    f,
                    "Forbidden: user role ({}) is not authorized to access this resource",
                    role
                )
            }
        }
    }
}

impl StdError for AuthError {}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            AppError::Database(DatabaseError::UniqueConstraintViolation(
                "A record with this value already exists".to_string(),
            ))
        } else if error_msg.contains("no rows") {
            AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Database(DatabaseError::ConnectionPool(error_msg))
        } else {
            AppError::Database(DatabaseError::UnexpectedError(error_msg))
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for log correlation
    pub error_id: String,
    /// Human-readable error message (stable, never internal detail)
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Stable outward code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => "DUPLICATE_ENTRY",
                DatabaseError::NotFound(_) => "NOT_FOUND",
                DatabaseError::ConnectionPool(_) => "SERVICE_UNAVAILABLE",
                DatabaseError::UnexpectedError(_) => "DATABASE_ERROR",
            },
            AppError::Auth(e) => match e {
                AuthError::MissingToken => "NO_TOKEN",
                AuthError::TokenInvalid => "TOKEN_INVALID",
                AuthError::TokenExpired => "TOKEN_EXPIRED",
                AuthError::UserGone => "USER_GONE",
                AuthError::NotAuthenticated => "NOT_AUTHENTICATED",
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::RoleNotAllowed(_) => "ROLE_NOT_ALLOWED",
            },
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Outward message. Internal failures collapse to a generic message;
    /// details go to the logs only.
    fn outward_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(msg) => msg.clone(),
                DatabaseError::NotFound(msg) => msg.clone(),
                DatabaseError::ConnectionPool(_) => {
                    "Database service temporarily unavailable".to_string()
                }
                DatabaseError::UnexpectedError(_) => "Database error occurred".to_string(),
            },
            AppError::Auth(e) => e.to_string(),
            AppError::Config(_) => "Server configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(error_id = error_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(error_id = error_id, error = %e, "Database error");
            }
            AppError::Config(e) => {
                tracing::error!(error_id = error_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::RoleNotAllowed(_) => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let status = self.status_code();
        let body = ErrorResponse::new(
            error_id,
            self.outward_message(),
            self.code().to_string(),
            status.as_u16(),
        );

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failures_map_to_401_with_distinct_codes() {
        let cases = [
            (AuthError::MissingToken, "NO_TOKEN"),
            (AuthError::TokenInvalid, "TOKEN_INVALID"),
            (AuthError::TokenExpired, "TOKEN_EXPIRED"),
            (AuthError::UserGone, "USER_GONE"),
            (AuthError::NotAuthenticated, "NOT_AUTHENTICATED"),
            (AuthError::InvalidCredentials, "INVALID_CREDENTIALS"),
        ];

        for (err, code) in cases {
            let app_err = AppError::Auth(err);
            assert_eq!(app_err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(app_err.code(), code);
        }
    }

    #[test]
    fn role_not_allowed_maps_to_403() {
        let err = AppError::Auth(AuthError::RoleNotAllowed(Role::Student));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "ROLE_NOT_ALLOWED");
    }

    #[test]
    fn internal_errors_never_leak_detail() {
        let err = AppError::Internal("bcrypt backend exploded".to_string());
        assert_eq!(err.outward_message(), "Internal server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_key_maps_to_conflict() {
        let sqlx_err = sqlx::Error::Protocol("duplicate key value violates unique constraint".into());
        let app_err: AppError = sqlx_err.into();
        assert_eq!(app_err.status_code(), StatusCode::CONFLICT);
        assert_eq!(app_err.code(), "DUPLICATE_ENTRY");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }
}
