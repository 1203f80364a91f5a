//! Session Store
//!
//! Owns the single local session slot. Validity is the conjunction of an absolute
//! lifetime and a sliding activity timeout; any read that finds the record invalid
//! or unreadable deletes it.
//!
//! One delayed task per store watches for inactivity. It is aborted and replaced on
//! every `create`, `touch` and `extend`, and aborted on `destroy`, so at most one is
//! ever pending. When it fires it re-reads the record against the clock and, if the
//! record really is stale, deletes it and publishes [`SessionEvent::Expired`].

use std::sync::{Arc, Weak};

use chrono::Duration;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionSettings;
use crate::domain::{
    Role, SessionEvent, SessionRecord, SessionStorage, StorageError, SESSION_KEY,
};
use crate::infrastructure::metrics;
use crate::infrastructure::storage::FileStorage;
use crate::shared::clock::Clock;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Absolute cap from creation (or last extend)
    pub lifetime: Duration,
    /// Maximum gap between activity signals
    pub activity_timeout: Duration,
}

impl SessionPolicy {
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            lifetime: Duration::milliseconds(settings.lifetime_ms as i64),
            activity_timeout: Duration::milliseconds(settings.activity_timeout_ms as i64),
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            lifetime: Duration::hours(1),
            activity_timeout: Duration::minutes(30),
        }
    }
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

struct StoreInner {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
    timer: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

/// Cloneable handle to one client's session slot.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
        policy: SessionPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                storage,
                clock,
                policy,
                timer: Mutex::new(None),
                events,
            }),
        }
    }

    /// File-backed store under `settings.storage_dir` with the configured durations.
    pub fn from_settings(settings: &SessionSettings, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(FileStorage::new(&settings.storage_dir)),
            clock,
            SessionPolicy::from_settings(settings),
        )
    }

    pub fn policy(&self) -> SessionPolicy {
        self.inner.policy
    }

    /// Subscribe to expiry notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Start a fresh session, replacing whatever was stored.
    pub async fn create(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
    ) -> Result<SessionRecord, SessionError> {
        let record = SessionRecord::new(
            user_id,
            email,
            role,
            self.inner.clock.now(),
            self.inner.policy.lifetime,
        );
        self.persist(&record).await?;
        self.schedule_expiry(self.inner.policy.activity_timeout);

        info!(
            session_id = %record.session_id,
            user_id = %record.user_id,
            role = %record.role,
            "Session created"
        );
        Ok(record)
    }

    /// The stored session if it is still valid. Invalid or corrupt records are deleted.
    pub async fn read(&self) -> Option<SessionRecord> {
        let raw = match self.inner.storage.get(SESSION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Session storage read failed; treating as signed out");
                self.destroy().await;
                return None;
            }
        };

        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable session record");
                self.destroy().await;
                return None;
            }
        };

        let now = self.inner.clock.now();
        if let Err(reason) = record.check_validity(now, self.inner.policy.activity_timeout) {
            debug!(session_id = %record.session_id, reason = reason.as_str(), "Session no longer valid");
            self.destroy().await;
            return None;
        }

        Some(record)
    }

    /// Record activity on a valid session. Never moves `expires_at`.
    pub async fn touch(&self) -> Result<Option<SessionRecord>, SessionError> {
        let Some(mut record) = self.read().await else {
            return Ok(None);
        };
        record.last_activity = self.inner.clock.now();
        self.persist(&record).await?;
        self.schedule_expiry(self.inner.policy.activity_timeout);
        Ok(Some(record))
    }

    /// Grant a full lifetime from now, in addition to recording activity.
    pub async fn extend(&self) -> Result<Option<SessionRecord>, SessionError> {
        let Some(mut record) = self.read().await else {
            return Ok(None);
        };
        let now = self.inner.clock.now();
        record.last_activity = now;
        record.expires_at = now + self.inner.policy.lifetime;
        self.persist(&record).await?;
        self.schedule_expiry(self.inner.policy.activity_timeout);

        debug!(session_id = %record.session_id, expires_at = %record.expires_at, "Session extended");
        Ok(Some(record))
    }

    /// Delete the record and cancel the timer. Safe to call repeatedly.
    pub async fn destroy(&self) {
        self.cancel_timer();
        if let Err(e) = self.inner.storage.remove(SESSION_KEY).await {
            warn!(error = %e, "Failed to remove session record");
        }
    }

    /// Wipe every key in the backing storage, not only the session slot.
    pub async fn clear_all(&self) {
        self.cancel_timer();
        if let Err(e) = self.inner.storage.clear().await {
            warn!(error = %e, "Failed to clear session storage");
        }
    }

    pub async fn is_valid(&self) -> bool {
        self.read().await.is_some()
    }

    /// Time left before the absolute lifetime ends, zero without a valid session.
    pub async fn remaining(&self) -> Duration {
        match self.read().await {
            Some(record) => record.remaining_at(self.inner.clock.now()),
            None => Duration::zero(),
        }
    }

    /// A valid session that also carries its identity fields. Malformed ones are destroyed.
    pub async fn validate(&self) -> bool {
        match self.read().await {
            Some(record) if record.has_integrity() => true,
            Some(record) => {
                warn!(session_id = %record.session_id, "Session record missing identity fields");
                self.destroy().await;
                false
            }
            None => false,
        }
    }

    async fn persist(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let json = serde_json::to_string(record)?;
        self.inner.storage.set(SESSION_KEY, &json).await?;
        Ok(())
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
    }

    /// Replace the pending timer with one firing after `delay`.
    fn schedule_expiry(&self, delay: Duration) {
        let delay = delay.to_std().unwrap_or_default();
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);

        let mut slot = self.inner.timer.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                SessionStore { inner }.on_expiry_timer().await;
            }
        }));
    }

    async fn on_expiry_timer(&self) {
        let raw = match self.inner.storage.get(SESSION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Session storage read failed in expiry timer");
                return;
            }
        };
        let record = match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable session record");
                if let Err(e) = self.inner.storage.remove(SESSION_KEY).await {
                    warn!(error = %e, "Failed to remove unreadable session record");
                }
                return;
            }
        };

        let now = self.inner.clock.now();
        let timeout = self.inner.policy.activity_timeout;
        match record.check_validity(now, timeout) {
            Err(reason) => {
                if !self.remove_if_current(&record.session_id).await {
                    debug!(session_id = %record.session_id, "Stale session replaced before removal");
                    return;
                }
                metrics::record_session_expired(reason.as_str());
                info!(session_id = %record.session_id, reason = reason.as_str(), "Session expired");
                let _ = self.inner.events.send(SessionEvent::Expired {
                    session_id: record.session_id,
                    reason,
                });
            }
            Ok(()) => {
                // Fired early relative to the clock; wait for the real deadline.
                let delay = record.valid_until(timeout) - now + Duration::milliseconds(1);
                self.schedule_expiry(delay);
            }
        }
    }

    /// Remove the slot only while it still holds `session_id`. Returns whether it did.
    async fn remove_if_current(&self, session_id: &str) -> bool {
        let current = match self.inner.storage.get(SESSION_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<SessionRecord>(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Session storage read failed in expiry timer");
                return false;
            }
        };
        if !matches!(current, Some(ref record) if record.session_id == session_id) {
            return false;
        }
        if let Err(e) = self.inner.storage.remove(SESSION_KEY).await {
            warn!(error = %e, "Failed to remove expired session record");
        }
        true
    }
}
