//! Application Layer
//!
//! Services that orchestrate the domain types against storage, the identity
//! provider and the backend, plus the DTOs exchanged over HTTP.

pub mod dto;
pub mod services;
