pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use gate::{AuthContext, AuthGate, RejectReason};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService, VerifiedToken};

lazy_static! {
    // Display names: letters, spaces, apostrophes, dots and hyphens
    static ref NAME_REGEX: regex::Regex = regex::Regex::new(r"^[\p{L}][\p{L} .'-]*$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    #[validate(email)]
    pub email: String,
    /// User's password.
    #[validate(length(min = 1, message = "Please provide an email and password"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, 2 to 50 characters.
    #[validate(
        length(min = 2, max = 50),
        regex(
            path = "NAME_REGEX",
            message = "Name may only contain letters, spaces, dots, apostrophes or hyphens"
        )
    )]
    pub name: String,
    /// Email address for the new account.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response structure after successful authentication (login or registration).
/// The token is the bearer credential for every later request.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
}
