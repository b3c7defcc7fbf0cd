/// Authentication routes: registration and login.
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::{issue_token, verify_password};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::models::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, Role};
use crate::store;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

/// POST /api/auth/register
///
/// Creates a user and returns a fresh token plus the public projection.
/// Only `student` and `instructor` are assignable; requests naming `admin`
/// are rejected.
///
/// # Errors
/// - 400: invalid email/name/password/role
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    is_valid_password(&form.password)?;

    let role = match form.role {
        None | Some(Role::Student) => Role::Student,
        Some(Role::Instructor) => Role::Instructor,
        Some(Role::Admin) => {
            return Err(AppError::Validation(ValidationError::InvalidFormat(
                "role must be one of: student, instructor".to_string(),
            )))
        }
    };

    let user = store::users::create_user(
        pool.get_ref(),
        &name,
        &email,
        &form.password,
        role,
        settings.bcrypt_cost,
    )
    .await?;

    let token = issue_token(user.id, settings.get_ref())?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// POST /api/auth/login
///
/// Verifies credentials and returns a fresh token. Unknown, malformed and
/// wrong-password emails all produce the same outward error, preventing user
/// enumeration. This is the one read path that requests the password digest.
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    // Normalize only; a malformed email falls through to the uniform 401
    // rather than revealing it could never match an account.
    let email = form.email.trim().to_lowercase();

    let (user, password_hash) =
        store::users::find_user_by_email_with_password(pool.get_ref(), &email)
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !verify_password(&form.password, &password_hash)? {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let token = issue_token(user.id, settings.get_ref())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}
