/// JWT claims.
///
/// The token binds to exactly one user: the subject is the sole identity
/// claim, alongside the standard expiry and issued-at instants (RFC 7519).
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Create claims for a user, expiring `expiry_seconds` from now.
    pub fn new(user_id: Uuid, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + expiry_seconds,
            iat: now,
        }
    }

    /// Extract the user ID from the subject claim.
    ///
    /// A non-UUID subject means the token was not issued by us, even if the
    /// signature somehow checked out.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}
