/// Authentication core.
///
/// Token issuance/verification, password hashing, and the access guard
/// (authenticate + authorize pipeline stages).
mod claims;
mod guard;
mod jwt;
mod password;

pub use claims::Claims;
pub use guard::authenticate;
pub use guard::authorize;
pub use guard::bearer_token;
pub use guard::can_modify_course;
pub use guard::AuthenticatedUser;
pub use jwt::issue_token;
pub use jwt::verify_token;
pub use password::hash_password;
pub use password::verify_password;
