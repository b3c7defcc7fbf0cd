/// Access guard.
///
/// Two explicit pipeline stages, composed by the caller:
///
/// 1. `authenticate` — bearer token extraction, token verification, identity
///    resolution. Terminal failures: `NO_TOKEN`, `TOKEN_INVALID`,
///    `TOKEN_EXPIRED`, `USER_GONE`.
/// 2. `authorize` — role allowlist check over an already-authenticated
///    context. Calling it without one is a contract violation
///    (`NOT_AUTHENTICATED`), distinct from an end-user failure.
use actix_web::{http::header, HttpRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::jwt::verify_token;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::models::{Role, User};
use crate::store;

/// The resolved identity of an authenticated request.
///
/// Built once per request by `authenticate` and never shared across requests.
/// Carries no credential material.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Extract a bearer token from the Authorization header.
///
/// An absent or malformed header (wrong scheme, non-UTF8) counts as no token.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication stage: token → claims → persisted user.
///
/// A token that verifies but whose subject no longer exists fails with
/// `UserGone` rather than a hard error; this covers a valid token for a
/// deleted account.
pub async fn authenticate(
    req: &HttpRequest,
    pool: &PgPool,
    settings: &AuthSettings,
) -> Result<AuthenticatedUser, AppError> {
    let token = bearer_token(req).ok_or(AppError::Auth(AuthError::MissingToken))?;

    let claims = verify_token(token, settings)?;
    let user_id = claims.user_id()?;

    let user = store::users::find_user_by_id(pool, user_id)
        .await?
        .ok_or(AppError::Auth(AuthError::UserGone))?;

    tracing::debug!(user_id = %user.id, role = %user.role, "Request authenticated");

    Ok(AuthenticatedUser::from(user))
}

/// Authorization stage: role allowlist check.
///
/// Requires the authentication stage to have produced a context; `None` fails
/// with `NotAuthenticated`.
pub fn authorize(
    context: Option<&AuthenticatedUser>,
    allowed_roles: &[Role],
) -> Result<(), AppError> {
    let user = context.ok_or(AppError::Auth(AuthError::NotAuthenticated))?;

    if allowed_roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Auth(AuthError::RoleNotAllowed(user.role)))
    }
}

/// Resource-ownership check for course mutation: admins may modify any
/// course, instructors only their own. Identifier equality over `Uuid`.
pub fn can_modify_course(user: &AuthenticatedUser, instructor_id: Uuid) -> bool {
    user.role == Role::Admin || user.id == instructor_id
}
