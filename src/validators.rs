/// Input validators.
///
/// Normalizes and bounds-checks user-supplied fields before they reach the
/// store. Emails are trimmed and lowercased so uniqueness is case-insensitive.
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::models::Lesson;

// User-facing caps count characters; the password cap is byte-based because
// bcrypt reads the first 72 bytes of input.
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 6;
// Bcrypt only considers the first 72 bytes of input.
const MAX_PASSWORD_LENGTH: usize = 72;
const MAX_COURSE_TITLE_LENGTH: usize = 150;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_LESSON_TITLE_LENGTH: usize = 100;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalizes an email address: trimmed, lowercased,
/// length-bounded, format-checked.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    if normalized.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }
    if normalized.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(&normalized) {
        return Err(ValidationError::InvalidFormat(
            "email has invalid format".to_string(),
        ));
    }

    Ok(normalized)
}

/// Validates a user's display name.
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name".to_string(), MAX_NAME_LENGTH));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(
            "name contains control characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Checks password shape before it reaches the hasher.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }
    Ok(())
}

/// Validates a course title.
pub fn is_valid_course_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("title".to_string()));
    }
    if trimmed.chars().count() > MAX_COURSE_TITLE_LENGTH {
        return Err(ValidationError::TooLong(
            "title".to_string(),
            MAX_COURSE_TITLE_LENGTH,
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates a course description.
pub fn is_valid_description(description: &str) -> Result<String, ValidationError> {
    if description.is_empty() {
        return Err(ValidationError::EmptyField("description".to_string()));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong(
            "description".to_string(),
            MAX_DESCRIPTION_LENGTH,
        ));
    }

    Ok(description.to_string())
}

/// Validates a course price.
pub fn is_valid_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidFormat(
            "price cannot be negative".to_string(),
        ));
    }
    Ok(price)
}

/// Validates an embedded lesson list.
pub fn are_valid_lessons(lessons: &[Lesson]) -> Result<(), ValidationError> {
    for lesson in lessons {
        if lesson.title.chars().count() > MAX_LESSON_TITLE_LENGTH {
            return Err(ValidationError::TooLong(
                "lesson title".to_string(),
                MAX_LESSON_TITLE_LENGTH,
            ));
        }
        if lesson.duration_minutes < 1 {
            return Err(ValidationError::InvalidFormat(
                "lesson duration must be at least 1 minute".to_string(),
            ));
        }
    }
    Ok(())
}
