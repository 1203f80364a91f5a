//! Admin Repository Implementation
//!
//! PostgreSQL implementation of the AdminRepository trait.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{AdminRecord, AdminRepository, AdminStatus, Role};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Database row representation of the `admins` table columns we read.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    email: String,
    role: String,
    status: String,
}

impl AdminRow {
    fn into_record(self) -> AdminRecord {
        AdminRecord {
            email: self.email,
            role: Role::from_str(&self.role),
            status: AdminStatus::from_str(&self.status),
        }
    }
}

/// PostgreSQL admin repository implementation.
#[derive(Clone)]
pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    /// Create a new PgAdminRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, AppError> {
        let start = Instant::now();
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT email, role, status
            FROM admins
            WHERE lower(email) = lower($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        metrics::record_db_query("select", "admins", start.elapsed().as_secs_f64());

        Ok(row.map(AdminRow::into_record))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
