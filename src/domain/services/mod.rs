//! Domain Services

mod role_resolver;

pub use role_resolver::RoleResolver;
