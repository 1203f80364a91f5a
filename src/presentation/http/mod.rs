//! HTTP surface: routes, handlers and auth cookie helpers.

pub mod cookies;
pub mod handlers;
pub mod routes;
