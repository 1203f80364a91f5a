//! Response DTOs

use serde::Serialize;

use crate::application::services::AdminContext;
use crate::domain::Role;

/// Login response. Tokens travel in cookies, never in the body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub role: Role,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub signed_out: bool,
}

/// Body of the protected placeholder routes.
#[derive(Debug, Serialize)]
pub struct AdminContextResponse {
    pub path: String,
    pub email: String,
    pub role: Role,
    pub master: bool,
}

impl AdminContextResponse {
    pub fn new(path: impl Into<String>, admin: &AdminContext) -> Self {
        Self {
            path: path.into(),
            email: admin.email.clone(),
            role: admin.role,
            master: admin.role.is_master(),
        }
    }
}
