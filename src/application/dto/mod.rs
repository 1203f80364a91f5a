//! Data Transfer Objects
//!
//! DTOs for API request/response serialization.

pub mod request;
pub mod response;

pub use request::{LoginRequest, SearchQuery};
pub use response::{AdminContextResponse, LoginResponse, LogoutResponse};
