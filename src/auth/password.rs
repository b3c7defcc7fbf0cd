/// Credential hasher.
///
/// One-way bcrypt hashing with a configurable work factor. Hashing is the
/// only intentionally expensive operation in the service; call sites invoke
/// it only when a stored password value actually changes.
use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a plaintext password with the given work factor.
///
/// # Errors
/// Backend failures surface as `AppError::Internal` and abort the enclosing
/// save operation.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored digest.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, AppError> {
    verify(password, digest)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost, to keep the test suite fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_is_salted_and_opaque() {
        let digest = hash_password("correct horse", TEST_COST).expect("Failed to hash");

        assert_ne!(digest, "correct horse");
        assert!(digest.starts_with("$2"));
    }

    #[test]
    fn verify_accepts_the_original_password() {
        let digest = hash_password("correct horse", TEST_COST).expect("Failed to hash");
        assert!(verify_password("correct horse", &digest).expect("Failed to verify"));
    }

    #[test]
    fn verify_rejects_a_different_password() {
        let digest = hash_password("correct horse", TEST_COST).expect("Failed to hash");
        assert!(!verify_password("battery staple", &digest).expect("Failed to verify"));
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let a = hash_password("correct horse", TEST_COST).expect("Failed to hash");
        let b = hash_password("correct horse", TEST_COST).expect("Failed to hash");
        assert_ne!(a, b);
    }

    #[test]
    fn out_of_range_cost_is_an_internal_error() {
        // bcrypt accepts costs 4 through 31 only
        let result = hash_password("correct horse", 99);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn garbage_digest_is_an_internal_error() {
        let result = verify_password("anything", "not-a-bcrypt-digest");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
