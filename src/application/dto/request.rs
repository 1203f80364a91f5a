//! Request DTOs

use serde::Deserialize;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 256, message = "Password is required"))]
    pub password: String,
}

/// Search query string
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(max = 200, message = "Query must be at most 200 characters"))]
    #[serde(default)]
    pub q: String,
}
