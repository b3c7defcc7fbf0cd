/// Core entities and request/response payloads.
///
/// The `User` entity has two read projections: `PublicUser` (no credential
/// material, the default everywhere) and the internal login-only read in the
/// store that carries the password digest. The digest never appears on any
/// serializable type in this module.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of user roles.
///
/// `Admin` is referenced by authorization checks but is not assignable
/// through any endpoint; admin accounts are seeded out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of course categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Development,
    Design,
    Marketing,
    Business,
    #[serde(rename = "IT & Software")]
    ItAndSoftware,
    #[serde(rename = "Personal Development")]
    PersonalDevelopment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Development => "Development",
            Category::Design => "Design",
            Category::Marketing => "Marketing",
            Category::Business => "Business",
            Category::ItAndSoftware => "IT & Software",
            Category::PersonalDevelopment => "Personal Development",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "Development" => Some(Category::Development),
            "Design" => Some(Category::Design),
            "Marketing" => Some(Category::Marketing),
            "Business" => Some(Category::Business),
            "IT & Software" => Some(Category::ItAndSoftware),
            "Personal Development" => Some(Category::PersonalDevelopment),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's canonical identity record, without credential material.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public read projection of a user.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Profile response: the public projection plus enrollment references.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub enrolled_courses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A single lesson embedded in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub duration_minutes: i32,
}

/// A course record.
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor_id: Uuid,
    pub price: f64,
    pub category: Category,
    pub image_url: Option<String>,
    pub lessons: Vec<Lesson>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Instructor fields joined into course reads.
#[derive(Debug, Clone, Serialize)]
pub struct InstructorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A course together with its instructor's public fields.
#[derive(Debug, Serialize)]
pub struct CourseWithInstructor {
    #[serde(flatten)]
    pub course: Course,
    pub instructor: InstructorSummary,
}

// --- Request payloads ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Only `student` and `instructor` are accepted; omitted means student.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update. A password change re-hashes; a name-only change
/// never touches the stored digest.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lessons: Option<Vec<Lesson>>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub lessons: Option<Vec<Lesson>>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    /// Free-text search over title and description.
    pub q: Option<String>,
    pub category: Option<String>,
    /// Instructor id filter (UUID string).
    pub instructor: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

// --- Response payloads ---

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub count: usize,
    pub total: i64,
    pub pagination: Pagination,
    pub data: Vec<CourseWithInstructor>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub count: usize,
    pub data: Vec<PublicUser>,
}
