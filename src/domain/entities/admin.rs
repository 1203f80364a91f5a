//! Admin entity and repository trait.
//!
//! Maps to the backend `admins` table:
//! - email: TEXT UNIQUE NOT NULL
//! - role: TEXT NOT NULL ('master_admin' | 'admin')
//! - status: TEXT NOT NULL ('active' | 'inactive')

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Privilege tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MasterAdmin,
    #[default]
    Admin,
}

impl Role {
    /// Convert from database string representation. Unknown values get the lowest tier.
    pub fn from_str(s: &str) -> Self {
        match s {
            "master_admin" => Self::MasterAdmin,
            _ => Self::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasterAdmin => "master_admin",
            Self::Admin => "admin",
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self, Self::MasterAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an admin may currently sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    Active,
    #[default]
    Inactive,
}

impl AdminStatus {
    /// Anything other than `active` is treated as inactive.
    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            _ => Self::Inactive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Backend-side authorization state for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub email: String,
    pub role: Role,
    pub status: AdminStatus,
}

impl AdminRecord {
    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }
}

/// Repository trait for admin lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Find the admin row for an email, active or not.
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, AppError>;

    /// Cheap round-trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}
