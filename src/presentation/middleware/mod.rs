//! Middleware
//!
//! Tower middleware for request processing.

pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod route_guard;
pub mod security;

pub use rate_limit::{rate_limit_api, rate_limit_search, EndpointType};
pub use route_guard::route_guard;
pub use security::SecurityHeadersConfig;
