//! Admin role lookup.

use std::sync::Arc;

use tracing::instrument;

use crate::domain::{AdminRepository, Role, RoleResolver};
use crate::shared::error::AppError;

#[derive(Clone)]
pub struct AdminDirectory {
    admins: Arc<dyn AdminRepository>,
    roles: RoleResolver,
}

impl AdminDirectory {
    pub fn new(admins: Arc<dyn AdminRepository>, roles: RoleResolver) -> Self {
        Self { admins, roles }
    }

    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }

    /// Role of an active admin, `None` if the email is not one.
    ///
    /// The configured master admin is recognized before the table is consulted.
    #[instrument(skip(self))]
    pub async fn check_admin_role(&self, email: &str) -> Result<Option<Role>, AppError> {
        if self.roles.is_master(email) {
            return Ok(Some(Role::MasterAdmin));
        }

        let record = self.admins.find_by_email(email).await?;
        Ok(record.filter(|r| r.is_active()).map(|r| r.role))
    }
}
