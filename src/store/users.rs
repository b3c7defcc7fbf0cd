/// User store and identity resolver.
///
/// Every read path projects the user without the password digest; the single
/// exception is `find_user_by_email_with_password`, used internally during
/// login verification, which must ask for the digest explicitly.
///
/// Hashing is invoked exactly where a stored password value changes
/// (`create_user`, and `update_me` when a new password is supplied) and
/// skipped everywhere else, so unrelated updates never re-hash.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::error::{AppError, DatabaseError};
use crate::models::{Role, User};

type UserRow = (Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>);

fn row_to_user(row: UserRow) -> Result<User, AppError> {
    let (id, name, email, role, created_at, updated_at) = row;
    let role = Role::parse(&role)
        .ok_or_else(|| AppError::Internal(format!("Unknown role in database: {}", role)))?;

    Ok(User {
        id,
        name,
        email,
        role,
        created_at,
        updated_at,
    })
}

/// Look up a user by identifier. Public projection: no digest.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, role, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_user).transpose()
}

/// Look up a user by email, including the password digest.
/// Login verification only.
pub async fn find_user_by_email_with_password(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(User, String)>, AppError> {
    let row = sqlx::query_as::<_, (Uuid, String, String, String, String, DateTime<Utc>, DateTime<Utc>)>(
        "SELECT id, name, email, role, password_hash, created_at, updated_at
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(|(id, name, email, role, password_hash, created_at, updated_at)| {
        let user = row_to_user((id, name, email, role, created_at, updated_at))?;
        Ok((user, password_hash))
    })
    .transpose()
}

/// Create a user. The plaintext password is hashed here, never stored.
///
/// A duplicate email surfaces as a unique-constraint violation (409).
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    bcrypt_cost: u32,
) -> Result<User, AppError> {
    let password_hash = hash_password(password, bcrypt_cost)?;
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        let app_err: AppError = e.into();
        match app_err {
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                AppError::Database(DatabaseError::UniqueConstraintViolation(
                    "Email already registered".to_string(),
                ))
            }
            other => other,
        }
    })?;

    Ok(User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        role,
        created_at: now,
        updated_at: now,
    })
}

/// Apply a partial profile update.
///
/// Only the fields present are written; the digest is recomputed only when a
/// new password is part of the update. Hashing happens before anything is
/// written, and both fields go through one statement, so a failure anywhere
/// leaves the row untouched.
pub async fn update_me(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    password: Option<&str>,
    bcrypt_cost: u32,
) -> Result<User, AppError> {
    let password_hash = password
        .map(|password| hash_password(password, bcrypt_cost))
        .transpose()?;

    sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE($1, name),
            password_hash = COALESCE($2, password_hash),
            updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(name)
    .bind(password_hash.as_deref())
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    find_user_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))
}

/// All users, public projection. Admin listing.
pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, role, created_at, updated_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_user).collect()
}

/// Course identifiers the user is enrolled in.
pub async fn enrolled_course_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
    let ids = sqlx::query_as::<_, (Uuid,)>(
        "SELECT course_id FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}
