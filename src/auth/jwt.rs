/// Token service.
///
/// Issues and verifies signed, expiring identity tokens (HS256). Verification
/// failures are distinguishable: an expired token and a malformed or
/// wrongly-signed token map to different error variants so callers can give
/// precise feedback. There is no refresh mechanism; re-issuance only happens
/// via a fresh login.
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

/// Issue a token for a user, expiring after the configured duration.
pub fn issue_token(user_id: Uuid, settings: &AuthSettings) -> Result<String, AppError> {
    let claims = Claims::new(user_id, settings.token_expiry_seconds);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify a token and return its claims.
///
/// # Errors
/// - `AuthError::TokenExpired` when the expiry instant has passed
/// - `AuthError::TokenInvalid` for anything else (bad signature, malformed)
pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // A token past its expiry instant must fail, with no grace window.
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Auth(AuthError::TokenExpired),
        _ => AppError::Auth(AuthError::TokenInvalid),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret-key-at-least-32-characters-long".to_string(),
            token_expiry_seconds: 3600,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let settings = test_settings();
        let user_id = Uuid::new_v4();

        let token = issue_token(user_id, &settings).expect("Failed to issue token");
        let claims = verify_token(&token, &settings).expect("Failed to verify token");

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn expired_token_fails_with_expired() {
        let settings = AuthSettings {
            token_expiry_seconds: -60,
            ..test_settings()
        };

        let token = issue_token(Uuid::new_v4(), &settings).expect("Failed to issue token");
        let err = verify_token(&token, &settings).unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::TokenExpired)));
    }

    #[test]
    fn wrong_secret_fails_with_invalid() {
        let settings = test_settings();
        let token = issue_token(Uuid::new_v4(), &settings).expect("Failed to issue token");

        let other = AuthSettings {
            jwt_secret: "a-completely-different-signing-secret".to_string(),
            ..test_settings()
        };
        let err = verify_token(&token, &other).unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));
    }

    #[test]
    fn malformed_token_fails_with_invalid() {
        let settings = test_settings();

        let err = verify_token("not.a.token", &settings).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));

        let tampered = format!("{}X", issue_token(Uuid::new_v4(), &settings).unwrap());
        let err = verify_token(&tampered, &settings).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));
    }
}
