//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits.

mod admin_repository;

pub use admin_repository::PgAdminRepository;
