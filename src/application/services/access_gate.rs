//! Access Gate
//!
//! Client-side page guard. On mount it cross-checks the local session slot against
//! the identity provider, then keeps listening for sign-out and expiry so a page
//! left open is sent back to login without polling.
//!
//! The gate is a convenience layer. The edge [`RouteAuthorizer`] re-checks every
//! request against the backend regardless of what the gate decided.
//!
//! [`RouteAuthorizer`]: super::RouteAuthorizer

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::services::SessionStore;
use crate::domain::{AuthEvent, Identity, IdentityProvider, RoleResolver, RoutePolicy, SessionEvent};
use crate::shared::sanitize::sanitize_for_log;

/// Client navigation.
pub trait Navigator: Send + Sync {
    /// Navigate, keeping the current entry in history.
    fn push(&self, path: &str);

    /// Navigate, replacing the current history entry.
    fn replace(&self, path: &str);
}

/// What a page demands of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateRequirement {
    pub require_auth: bool,
    pub require_master_admin: bool,
}

impl GateRequirement {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            require_master_admin: false,
        }
    }

    pub fn master_admin() -> Self {
        Self {
            require_auth: true,
            require_master_admin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Authorized,
    Unauthorized,
}

/// Handle for a running listener. Dropping it stops the listener.
pub struct GateSubscription {
    handle: JoinHandle<()>,
}

impl GateSubscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for GateSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct AccessGate {
    store: SessionStore,
    identity: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    roles: RoleResolver,
    policy: RoutePolicy,
    requirement: GateRequirement,
    state: RwLock<GateState>,
    user_email: RwLock<Option<String>>,
}

impl AccessGate {
    pub fn new(
        store: SessionStore,
        identity: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        roles: RoleResolver,
        policy: RoutePolicy,
        requirement: GateRequirement,
    ) -> Self {
        Self {
            store,
            identity,
            navigator,
            roles,
            policy,
            requirement,
            state: RwLock::new(GateState::Checking),
            user_email: RwLock::new(None),
        }
    }

    pub fn state(&self) -> GateState {
        *self.state.read()
    }

    pub fn user_email(&self) -> Option<String> {
        self.user_email.read().clone()
    }

    pub fn requirement(&self) -> GateRequirement {
        self.requirement
    }

    /// Decide whether the page at `pathname` may render.
    pub async fn mount(&self, pathname: &str) -> GateState {
        self.set_state(GateState::Checking);

        let (local, remote) = tokio::join!(self.store.read(), self.identity.current_session());

        let identity = match remote {
            Ok(Some(identity)) => identity,
            Ok(None) => return self.deny_unauthenticated(pathname).await,
            Err(e) => {
                warn!(error = %e, "Identity provider check failed");
                return self.deny_unauthenticated(pathname).await;
            }
        };

        if self.requirement.require_master_admin && !self.roles.is_master(&identity.email) {
            info!(
                email = %sanitize_for_log(&identity.email),
                path = pathname,
                "Master admin page denied"
            );
            self.set_state(GateState::Unauthorized);
            self.navigator.push(self.policy.dashboard_path());
            return GateState::Unauthorized;
        }

        let synced = match local {
            Some(record) if record.user_id == identity.user_id => self.store.touch().await.map(|_| ()),
            _ => self
                .store
                .create(&identity.user_id, &identity.email, self.roles.resolve(&identity.email))
                .await
                .map(|_| ()),
        };
        if let Err(e) = synced {
            warn!(error = %e, "Failed to sync local session");
            return self.deny_unauthenticated(pathname).await;
        }

        *self.user_email.write() = Some(identity.email);
        self.set_state(GateState::Authorized);
        GateState::Authorized
    }

    /// Start reacting to provider sign-in/sign-out and store expiry.
    pub fn listen(self: &Arc<Self>) -> GateSubscription {
        let gate = Arc::clone(self);
        let mut auth_events = self.identity.subscribe();
        let mut session_events = self.store.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = auth_events.recv() => match event {
                        Ok(event) => gate.handle_auth_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Auth event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    event = session_events.recv() => match event {
                        Ok(event) => gate.handle_session_event(event),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Access gate listener stopped");
        });

        GateSubscription { handle }
    }

    pub async fn handle_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedOut => {
                self.store.destroy().await;
                *self.user_email.write() = None;
                self.set_state(GateState::Unauthorized);
                if self.requirement.require_auth {
                    self.navigator.replace(self.policy.login_path());
                }
            }
            AuthEvent::SignedIn(identity) => {
                if self.satisfies(&identity) {
                    *self.user_email.write() = Some(identity.email);
                    self.set_state(GateState::Authorized);
                }
            }
        }
    }

    pub fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Expired { session_id, reason } => {
                info!(%session_id, reason = reason.as_str(), "Session expired; leaving page");
                *self.user_email.write() = None;
                self.set_state(GateState::Unauthorized);
                if self.requirement.require_auth {
                    self.navigator.replace(self.policy.login_path());
                }
            }
        }
    }

    /// Navigation time check. `false` means the viewer was sent to login.
    pub async fn check_page_access(&self, pathname: &str) -> bool {
        if !self.policy.is_protected(pathname) {
            return true;
        }
        if self.store.is_valid().await {
            return true;
        }

        self.store.destroy().await;
        self.navigator.replace(self.policy.login_path());
        false
    }

    fn satisfies(&self, identity: &Identity) -> bool {
        !self.requirement.require_master_admin || self.roles.is_master(&identity.email)
    }

    async fn deny_unauthenticated(&self, pathname: &str) -> GateState {
        self.store.destroy().await;
        *self.user_email.write() = None;
        self.set_state(GateState::Unauthorized);
        if self.requirement.require_auth && pathname != self.policy.login_path() {
            self.navigator.push(self.policy.login_path());
        }
        GateState::Unauthorized
    }

    fn set_state(&self, state: GateState) {
        *self.state.write() = state;
    }
}
