//! # Quiz Admin Gate
//!
//! Session, rate limiting and route gating for the admin console of a live quiz
//! show:
//! - Fixed-window rate limiters for login, search and API traffic
//! - A local session store with absolute lifetime, sliding inactivity timeout and
//!   an expiry timer that notifies subscribers
//! - A client-side page gate that cross-checks the local session with the hosted
//!   identity provider
//! - An axum edge guard that re-validates every protected request against the
//!   identity provider and the `admins` table
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Entities, value objects, and provider/repository traits
//! - **Application Layer**: Session store, access gate, route authorizer, login
//! - **Infrastructure Layer**: Rate limiter, storage, PostgreSQL, identity client
//! - **Presentation Layer**: HTTP routes, handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! quiz_admin_gate/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Limiter, storage, database, identity client, metrics
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Common utilities (errors, clock, log sanitizing)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
