//! # Domain Layer
//!
//! Core types of the access-control subsystem. Independent of HTTP, storage and
//! the hosted backend.
//!
//! ## Structure
//!
//! - **entities**: sessions, admins, identities, and the traits that fetch or persist them
//! - **value_objects**: route policy
//! - **services**: role resolution

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;
