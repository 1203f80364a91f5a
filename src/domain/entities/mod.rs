//! # Domain Entities
//!
//! - **SessionRecord**: the single local session slot and its storage contract
//! - **AdminRecord**: a row of the backend `admins` table
//! - **Identity**: who the identity provider says the caller is
//!
//! Each entity sits next to the trait that loads or stores it; implementations live
//! in the infrastructure layer.

mod admin;
mod identity;
mod session;

pub use admin::{AdminRecord, AdminRepository, AdminStatus, Role};
pub use identity::{AuthEvent, AuthSession, Identity, IdentityError, IdentityProvider};
pub use session::{
    ExpiryReason, SessionEvent, SessionRecord, SessionStorage, StorageError, SESSION_KEY,
};

#[cfg(test)]
pub use admin::MockAdminRepository;
#[cfg(test)]
pub use identity::MockIdentityProvider;
