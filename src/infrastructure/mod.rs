//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL `admins` table)
//! - Identity provider HTTP client
//! - Session storage backends
//! - In-memory rate limiters
//! - Prometheus metrics

pub mod database;
pub mod identity;
pub mod metrics;
pub mod rate_limit;
pub mod repositories;
pub mod storage;
