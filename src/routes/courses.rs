/// Course routes: public catalogue reads plus guarded mutation and
/// enrollment.
///
/// The guarded handlers compose the access-guard stages explicitly:
/// `authenticate` first, then `authorize` or the ownership check.
use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{authenticate, authorize, can_modify_course};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::models::{
    Category, CourseListQuery, CourseListResponse, CreateCourseRequest, Pagination, Role,
    UpdateCourseRequest,
};
use crate::store;
use crate::store::courses::CourseFilter;
use crate::validators::{
    are_valid_lessons, is_valid_course_title, is_valid_description, is_valid_price,
};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

fn parse_course_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        AppError::Validation(ValidationError::InvalidFormat(
            "Invalid course ID format".to_string(),
        ))
    })
}

fn course_not_found() -> AppError {
    AppError::Database(DatabaseError::NotFound("Course not found".to_string()))
}

/// GET /api/courses
///
/// Published courses only, with search, category and instructor filters,
/// pagination, and whitelisted sorting.
pub async fn list_courses(
    query: web::Query<CourseListQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let category = query
        .category
        .as_deref()
        .map(|raw| {
            Category::parse(raw).ok_or_else(|| {
                AppError::Validation(ValidationError::InvalidFormat(
                    "Unknown course category".to_string(),
                ))
            })
        })
        .transpose()?;

    let instructor = query
        .instructor
        .as_deref()
        .map(|raw| {
            Uuid::parse_str(raw).map_err(|_| {
                AppError::Validation(ValidationError::InvalidFormat(
                    "Invalid instructor ID format".to_string(),
                ))
            })
        })
        .transpose()?;

    let filter = CourseFilter {
        search: query.q.clone(),
        category,
        instructor,
    };
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (data, total) =
        store::courses::list_courses(pool.get_ref(), &filter, page, limit, query.sort.as_deref())
            .await?;

    Ok(HttpResponse::Ok().json(CourseListResponse {
        count: data.len(),
        total,
        pagination: Pagination { page, limit },
        data,
    }))
}

/// GET /api/courses/{id}
pub async fn get_course(
    path: web::Path<String>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = parse_course_id(&path)?;

    let course = store::courses::find_course_with_instructor(pool.get_ref(), id)
        .await?
        .ok_or_else(course_not_found)?;

    Ok(HttpResponse::Ok().json(course))
}

/// POST /api/courses
///
/// Instructor/admin only. The caller becomes the owning instructor.
pub async fn create_course(
    req: HttpRequest,
    form: web::Json<CreateCourseRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&req, pool.get_ref(), settings.get_ref()).await?;
    authorize(Some(&user), &[Role::Instructor, Role::Admin])?;

    let title = is_valid_course_title(&form.title)?;
    let description = is_valid_description(&form.description)?;
    let price = is_valid_price(form.price.unwrap_or(0.0))?;
    let lessons = form.lessons.clone().unwrap_or_default();
    are_valid_lessons(&lessons)?;

    let course = store::courses::create_course(
        pool.get_ref(),
        user.id,
        &title,
        &description,
        form.category,
        price,
        form.image_url.as_deref(),
        lessons,
        form.published.unwrap_or(false),
    )
    .await?;

    tracing::info!(course_id = %course.id, instructor_id = %user.id, "Course created");

    Ok(HttpResponse::Created().json(course))
}

/// PUT /api/courses/{id}
///
/// Owner or admin only. Partial update.
pub async fn update_course(
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Json<UpdateCourseRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&req, pool.get_ref(), settings.get_ref()).await?;
    let id = parse_course_id(&path)?;

    let existing = store::courses::find_course_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(course_not_found)?;

    if !can_modify_course(&user, existing.instructor_id) {
        return Err(AppError::Auth(AuthError::RoleNotAllowed(user.role)));
    }

    if let Some(title) = form.title.as_deref() {
        is_valid_course_title(title)?;
    }
    if let Some(description) = form.description.as_deref() {
        is_valid_description(description)?;
    }
    if let Some(price) = form.price {
        is_valid_price(price)?;
    }
    if let Some(lessons) = form.lessons.as_deref() {
        are_valid_lessons(lessons)?;
    }

    let course = store::courses::update_course(pool.get_ref(), id, &form).await?;

    tracing::info!(course_id = %course.id, user_id = %user.id, "Course updated");

    Ok(HttpResponse::Ok().json(course))
}

/// DELETE /api/courses/{id}
///
/// Owner or admin only.
pub async fn delete_course(
    req: HttpRequest,
    path: web::Path<String>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&req, pool.get_ref(), settings.get_ref()).await?;
    let id = parse_course_id(&path)?;

    let existing = store::courses::find_course_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(course_not_found)?;

    if !can_modify_course(&user, existing.instructor_id) {
        return Err(AppError::Auth(AuthError::RoleNotAllowed(user.role)));
    }

    store::courses::delete_course(pool.get_ref(), id).await?;

    tracing::info!(course_id = %id, user_id = %user.id, "Course deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Course deleted successfully"
    })))
}

/// POST /api/courses/{id}/enroll
///
/// Student/admin only. Double enrollment is rejected.
pub async fn enroll_course(
    req: HttpRequest,
    path: web::Path<String>,
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&req, pool.get_ref(), settings.get_ref()).await?;
    authorize(Some(&user), &[Role::Student, Role::Admin])?;

    let id = parse_course_id(&path)?;

    store::courses::find_course_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(course_not_found)?;

    if store::courses::is_enrolled(pool.get_ref(), id, user.id).await? {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "Already enrolled in this course".to_string(),
        )));
    }

    store::courses::enroll(pool.get_ref(), id, user.id).await?;

    tracing::info!(course_id = %id, user_id = %user.id, "User enrolled");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Enrolled successfully"
    })))
}
