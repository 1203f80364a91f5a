//! Presentation Layer
//!
//! HTTP routes, handlers and the edge middleware.

pub mod http;
pub mod middleware;
