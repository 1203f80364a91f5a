//! Local session record and its storage contract.
//!
//! Exactly one record exists per client, stored under [`SESSION_KEY`] as JSON:
//!
//! ```json
//! {"sessionId":"…","userId":"…","email":"…","role":"admin",
//!  "loginTime":1700000000000,"lastActivity":1700000000000,"expiresAt":1700003600000}
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Storage key of the single session slot.
pub const SESSION_KEY: &str = "quiz_session";

/// Identity snapshot taken at login plus its validity bookkeeping.
///
/// The role is copied at creation and never re-fetched; a server-side role change
/// is only observed after the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub login_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_activity: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

/// Why a session stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// No activity within the activity timeout
    Inactive,
    /// Past the absolute lifetime
    LifetimeElapsed,
}

impl ExpiryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::LifetimeElapsed => "lifetime_elapsed",
        }
    }
}

/// Notifications published by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Expired {
        session_id: String,
        reason: ExpiryReason,
    },
}

impl SessionRecord {
    /// Start a new session at `now` that hard-expires after `lifetime`.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().simple().to_string(),
            user_id: user_id.into(),
            email: email.into(),
            role,
            login_time: now,
            last_activity: now,
            expires_at: now + lifetime,
        }
    }

    /// `Ok(())` iff `now <= expires_at` and `now - last_activity <= activity_timeout`.
    pub fn check_validity(
        &self,
        now: DateTime<Utc>,
        activity_timeout: Duration,
    ) -> Result<(), ExpiryReason> {
        if now > self.expires_at {
            return Err(ExpiryReason::LifetimeElapsed);
        }
        if now - self.last_activity > activity_timeout {
            return Err(ExpiryReason::Inactive);
        }
        Ok(())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>, activity_timeout: Duration) -> bool {
        self.check_validity(now, activity_timeout).is_ok()
    }

    /// Last instant at which the record is still valid.
    pub fn valid_until(&self, activity_timeout: Duration) -> DateTime<Utc> {
        std::cmp::min(self.expires_at, self.last_activity + activity_timeout)
    }

    /// Time left before the absolute lifetime runs out, never negative.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        std::cmp::max(Duration::zero(), self.expires_at - now)
    }

    /// Required identity fields are present.
    pub fn has_integrity(&self) -> bool {
        !self.session_id.is_empty() && !self.email.is_empty() && !self.user_id.is_empty()
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Client-local key-value storage holding serialized session data.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key held by this storage.
    async fn clear(&self) -> Result<(), StorageError>;
}
