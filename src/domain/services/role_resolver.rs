//! Master admin designation.
//!
//! One configured email is the superuser. It is recognized by comparison alone,
//! without consulting the `admins` table; every other identity gets the default tier
//! here and its real row is checked where the backend is consulted.

use crate::domain::entities::Role;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleResolver {
    master_admin_email: Option<String>,
}

impl RoleResolver {
    pub fn new(master_admin_email: Option<String>) -> Self {
        let master_admin_email = master_admin_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());
        Self { master_admin_email }
    }

    pub fn is_master(&self, email: &str) -> bool {
        self.master_admin_email
            .as_deref()
            .is_some_and(|master| master.eq_ignore_ascii_case(email.trim()))
    }

    pub fn resolve(&self, email: &str) -> Role {
        if self.is_master(email) {
            Role::MasterAdmin
        } else {
            Role::Admin
        }
    }
}
