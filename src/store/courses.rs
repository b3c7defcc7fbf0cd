/// Course store: CRUD, filtered listing, and enrollment.
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, DatabaseError};
use crate::models::{
    Category, Course, CourseWithInstructor, InstructorSummary, Lesson, UpdateCourseRequest,
};

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    description: String,
    instructor_id: Uuid,
    price: f64,
    category: String,
    image_url: Option<String>,
    lessons: Json<Vec<Lesson>>,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CourseJoinRow {
    id: Uuid,
    title: String,
    description: String,
    instructor_id: Uuid,
    price: f64,
    category: String,
    image_url: Option<String>,
    lessons: Json<Vec<Lesson>>,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    instructor_name: String,
    instructor_email: String,
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    Category::parse(raw)
        .ok_or_else(|| AppError::Internal(format!("Unknown category in database: {}", raw)))
}

impl CourseRow {
    fn into_course(self) -> Result<Course, AppError> {
        Ok(Course {
            id: self.id,
            title: self.title,
            description: self.description,
            instructor_id: self.instructor_id,
            price: self.price,
            category: parse_category(&self.category)?,
            image_url: self.image_url,
            lessons: self.lessons.0,
            published: self.published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CourseJoinRow {
    fn into_course_with_instructor(self) -> Result<CourseWithInstructor, AppError> {
        let instructor = InstructorSummary {
            id: self.instructor_id,
            name: self.instructor_name,
            email: self.instructor_email,
        };
        let course = Course {
            id: self.id,
            title: self.title,
            description: self.description,
            instructor_id: self.instructor_id,
            price: self.price,
            category: parse_category(&self.category)?,
            image_url: self.image_url,
            lessons: self.lessons.0,
            published: self.published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok(CourseWithInstructor { course, instructor })
    }
}

/// Listing filter, already validated by the route layer.
#[derive(Debug, Default)]
pub struct CourseFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub instructor: Option<Uuid>,
}

/// Map a client sort key to an ORDER BY clause. Whitelist only; unknown keys
/// fall back to newest-first.
pub fn order_by_clause(sort: Option<&str>) -> &'static str {
    match sort {
        Some("created_at") => "c.created_at ASC",
        Some("price") => "c.price ASC",
        Some("-price") => "c.price DESC",
        Some("title") => "c.title ASC",
        Some("-title") => "c.title DESC",
        _ => "c.created_at DESC",
    }
}

const LIST_COLUMNS: &str = "c.id, c.title, c.description, c.instructor_id, c.price, c.category, \
     c.image_url, c.lessons, c.published, c.created_at, c.updated_at, \
     u.name AS instructor_name, u.email AS instructor_email";

const LIST_FILTER: &str = "c.published = TRUE \
     AND ($1::text IS NULL OR c.title ILIKE '%' || $1 || '%' OR c.description ILIKE '%' || $1 || '%') \
     AND ($2::text IS NULL OR c.category = $2) \
     AND ($3::uuid IS NULL OR c.instructor_id = $3)";

/// Published courses matching the filter, paginated and sorted, with the
/// total match count for pagination metadata.
pub async fn list_courses(
    pool: &PgPool,
    filter: &CourseFilter,
    page: u32,
    limit: u32,
    sort: Option<&str>,
) -> Result<(Vec<CourseWithInstructor>, i64), AppError> {
    let category = filter.category.map(|c| c.as_str().to_string());
    let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM courses c WHERE {}",
        LIST_FILTER
    ))
    .bind(&filter.search)
    .bind(&category)
    .bind(filter.instructor)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, CourseJoinRow>(&format!(
        "SELECT {} FROM courses c JOIN users u ON u.id = c.instructor_id \
         WHERE {} ORDER BY {} LIMIT $4 OFFSET $5",
        LIST_COLUMNS,
        LIST_FILTER,
        order_by_clause(sort),
    ))
    .bind(&filter.search)
    .bind(&category)
    .bind(filter.instructor)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let courses = rows
        .into_iter()
        .map(CourseJoinRow::into_course_with_instructor)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((courses, total))
}

/// Single course with its instructor joined in.
pub async fn find_course_with_instructor(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<CourseWithInstructor>, AppError> {
    let row = sqlx::query_as::<_, CourseJoinRow>(&format!(
        "SELECT {} FROM courses c JOIN users u ON u.id = c.instructor_id WHERE c.id = $1",
        LIST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(CourseJoinRow::into_course_with_instructor).transpose()
}

/// Single course, ownership checks and enrollment.
pub async fn find_course_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Course>, AppError> {
    let row = sqlx::query_as::<_, CourseRow>(
        "SELECT id, title, description, instructor_id, price, category, image_url, lessons, \
         published, created_at, updated_at FROM courses WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(CourseRow::into_course).transpose()
}

/// Insert a new course owned by `instructor_id`.
pub async fn create_course(
    pool: &PgPool,
    instructor_id: Uuid,
    title: &str,
    description: &str,
    category: Category,
    price: f64,
    image_url: Option<&str>,
    lessons: Vec<Lesson>,
    published: bool,
) -> Result<Course, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, title, description, instructor_id, price, category, image_url, lessons,
             published, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(instructor_id)
    .bind(price)
    .bind(category.as_str())
    .bind(image_url)
    .bind(Json(&lessons))
    .bind(published)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        let app_err: AppError = e.into();
        match app_err {
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                AppError::Database(DatabaseError::UniqueConstraintViolation(
                    "A course with this title already exists".to_string(),
                ))
            }
            other => other,
        }
    })?;

    Ok(Course {
        id,
        title: title.to_string(),
        description: description.to_string(),
        instructor_id,
        price,
        category,
        image_url: image_url.map(str::to_string),
        lessons,
        published,
        created_at: now,
        updated_at: now,
    })
}

/// Partial update: only fields present in the request are written.
pub async fn update_course(
    pool: &PgPool,
    id: Uuid,
    changes: &UpdateCourseRequest,
) -> Result<Course, AppError> {
    sqlx::query(
        r#"
        UPDATE courses SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            category = COALESCE($3, category),
            price = COALESCE($4, price),
            image_url = COALESCE($5, image_url),
            lessons = COALESCE($6, lessons),
            published = COALESCE($7, published),
            updated_at = $8
        WHERE id = $9
        "#,
    )
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.category.map(|c| c.as_str()))
    .bind(changes.price)
    .bind(changes.image_url.as_deref())
    .bind(changes.lessons.as_ref().map(Json))
    .bind(changes.published)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    find_course_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Course not found".to_string())))
}

pub async fn delete_course(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn is_enrolled(pool: &PgPool, course_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE course_id = $1 AND user_id = $2)",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Record an enrollment. The primary key on (course_id, user_id) rejects
/// duplicates at the database level as well.
pub async fn enroll(pool: &PgPool, course_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("INSERT INTO enrollments (course_id, user_id, enrolled_at) VALUES ($1, $2, $3)")
        .bind(course_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| {
            let app_err: AppError = e.into();
            match app_err {
                AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                    AppError::Database(DatabaseError::UniqueConstraintViolation(
                        "Already enrolled in this course".to_string(),
                    ))
                }
                other => other,
            }
        })?;

    Ok(())
}
