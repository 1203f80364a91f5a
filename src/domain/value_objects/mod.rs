//! Value Objects

mod route_policy;

pub use route_policy::RoutePolicy;
