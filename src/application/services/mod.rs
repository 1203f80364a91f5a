//! Application Services
//!
//! ## Available Services
//!
//! - **SessionStore**: the single local session slot with expiry timer
//! - **AccessGate**: client-side page guard
//! - **RouteAuthorizer**: edge request authorization decisions
//! - **LoginService**: rate-limited password sign-in
//! - **AdminDirectory**: admin role lookup with the master admin special case

pub mod access_gate;
pub mod admin_directory;
pub mod login_service;
pub mod route_authorizer;
pub mod session_store;

pub use access_gate::{AccessGate, GateRequirement, GateState, GateSubscription, Navigator};
pub use admin_directory::AdminDirectory;
pub use login_service::{LoginError, LoginOutcome, LoginService};
pub use route_authorizer::{AdminContext, DenyReason, RouteAuthorizer, RouteDecision};
pub use session_store::{SessionError, SessionPolicy, SessionStore};
