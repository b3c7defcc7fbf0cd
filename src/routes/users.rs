/// User routes: own profile and the admin listing.
///
/// These sit behind the access-guard middleware, which injects the
/// authenticated user into request extensions.
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::{authorize, AuthenticatedUser};
use crate::configuration::AuthSettings;
use crate::error::{AppError, ValidationError};
use crate::models::{PublicUser, Role, UpdateMeRequest, UserListResponse, UserProfile};
use crate::store;
use crate::validators::{is_valid_name, is_valid_password};

async fn profile_of(pool: &PgPool, user_id: uuid::Uuid) -> Result<UserProfile, AppError> {
    let user = store::users::find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Database(crate::error::DatabaseError::NotFound(
                "User not found".to_string(),
            ))
        })?;
    let enrolled_courses = store::users::enrolled_course_ids(pool, user_id).await?;

    Ok(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        enrolled_courses,
        created_at: user.created_at,
    })
}

/// GET /api/users/me
pub async fn get_me(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let profile = profile_of(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/users/me
///
/// Accepts `name` and/or `password`. A name-only update leaves the stored
/// digest untouched; a password update re-hashes. An empty update set is a
/// validation error.
pub async fn update_me(
    user: web::ReqData<AuthenticatedUser>,
    form: web::Json<UpdateMeRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    if form.name.is_none() && form.password.is_none() {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "No valid fields provided for update".to_string(),
        )));
    }

    let name = form.name.as_deref().map(is_valid_name).transpose()?;
    if let Some(password) = form.password.as_deref() {
        is_valid_password(password)?;
    }

    store::users::update_me(
        pool.get_ref(),
        user.id,
        name.as_deref(),
        form.password.as_deref(),
        settings.bcrypt_cost,
    )
    .await?;

    tracing::info!(user_id = %user.id, password_changed = form.password.is_some(), "Profile updated");

    let profile = profile_of(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/users
///
/// Admin only: public projections of every user.
pub async fn list_users(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    authorize(Some(&*user), &[Role::Admin])?;

    let users = store::users::list_users(pool.get_ref()).await?;
    let data: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();

    Ok(HttpResponse::Ok().json(UserListResponse {
        count: data.len(),
        data,
    }))
}
