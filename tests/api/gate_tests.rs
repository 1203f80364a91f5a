//! Access gate flows over the in-memory session store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use pretty_assertions::assert_eq;

use quiz_admin_gate::application::services::{
    AccessGate, AdminDirectory, GateRequirement, GateState, LoginService, SessionPolicy,
    SessionStore,
};
use quiz_admin_gate::domain::{
    AdminStatus, IdentityProvider, Role, RoleResolver, RoutePolicy, SESSION_KEY,
};
use quiz_admin_gate::infrastructure::rate_limit::RateLimiter;
use quiz_admin_gate::infrastructure::storage::MemoryStorage;
use quiz_admin_gate::shared::clock::ManualClock;

use crate::common::{FakeAdminRepository, FakeIdentityProvider, RecordingNavigator, MASTER_EMAIL};

struct Client {
    store: SessionStore,
    storage: Arc<MemoryStorage>,
    clock: Arc<ManualClock>,
    identity: Arc<FakeIdentityProvider>,
    navigator: Arc<RecordingNavigator>,
}

impl Client {
    fn new(identity: FakeIdentityProvider) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::at_millis(0));
        Self {
            store: SessionStore::new(storage.clone(), clock.clone(), SessionPolicy::default()),
            storage,
            clock,
            identity: Arc::new(identity),
            navigator: Arc::new(RecordingNavigator::default()),
        }
    }

    fn gate(&self, requirement: GateRequirement) -> Arc<AccessGate> {
        Arc::new(AccessGate::new(
            self.store.clone(),
            self.identity.clone(),
            self.navigator.clone(),
            RoleResolver::new(Some(MASTER_EMAIL.into())),
            RoutePolicy::default(),
            requirement,
        ))
    }
}

#[tokio::test]
async fn test_master_only_page_with_admin_session_goes_to_dashboard() {
    let client = Client::new(FakeIdentityProvider::new().with_current("admin@example.com"));
    let existing = client
        .store
        .create("user-admin", "admin@example.com", Role::Admin)
        .await
        .unwrap();

    let gate = client.gate(GateRequirement::master_admin());
    assert_eq!(gate.mount("/admin-management").await, GateState::Unauthorized);

    assert_eq!(client.navigator.pushed(), vec!["/dashboard".to_string()]);
    assert_eq!(client.store.read().await, Some(existing));
}

#[tokio::test]
async fn test_login_then_mount_authorizes() {
    let client = Client::new(
        FakeIdentityProvider::new().with_account("admin@example.com", "correct horse"),
    );
    let admins = FakeAdminRepository::new().with_admin(
        "admin@example.com",
        Role::Admin,
        AdminStatus::Active,
    );
    let login = LoginService::new(
        RateLimiter::new(5, Duration::minutes(15)),
        client.identity.clone(),
        AdminDirectory::new(Arc::new(admins), RoleResolver::new(Some(MASTER_EMAIL.into()))),
    );

    let outcome = login
        .login(&client.store, "admin@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(outcome.role, Role::Admin);

    let gate = client.gate(GateRequirement::authenticated());
    client.clock.set_millis(5_000);
    assert_eq!(gate.mount("/dashboard").await, GateState::Authorized);

    let record = client.store.read().await.unwrap();
    assert_eq!(record.email, "admin@example.com");
    assert_eq!(record.last_activity.timestamp_millis(), 5_000);
    assert!(client.navigator.pushed().is_empty());
}

#[tokio::test]
async fn test_provider_sign_out_sends_open_page_to_login() {
    let client = Client::new(FakeIdentityProvider::new().with_current("admin@example.com"));
    let gate = client.gate(GateRequirement::authenticated());
    gate.mount("/dashboard").await;
    let _subscription = gate.listen();

    client.identity.sign_out().await.unwrap();
    tokio::time::timeout(StdDuration::from_secs(1), async {
        while client.navigator.replaced().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert_eq!(client.navigator.replaced(), vec!["/login".to_string()]);
    assert_eq!(gate.state(), GateState::Unauthorized);
    assert!(!client.storage.contains(SESSION_KEY));
}

#[tokio::test(start_paused = true)]
async fn test_idle_page_is_sent_to_login_by_expiry_timer() {
    let client = Client::new(FakeIdentityProvider::new().with_current("admin@example.com"));
    let gate = client.gate(GateRequirement::authenticated());
    assert_eq!(gate.mount("/dashboard").await, GateState::Authorized);
    let _subscription = gate.listen();

    // Thirty idle minutes plus a millisecond, on both clocks.
    client.clock.set_millis(1_800_001);
    tokio::time::sleep(StdDuration::from_millis(1_800_050)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    assert_eq!(client.navigator.replaced(), vec!["/login".to_string()]);
    assert_eq!(gate.state(), GateState::Unauthorized);
    assert!(!client.storage.contains(SESSION_KEY));
}

#[tokio::test]
async fn test_navigation_check_without_session() {
    let client = Client::new(FakeIdentityProvider::new());
    let gate = client.gate(GateRequirement::authenticated());

    assert!(gate.check_page_access("/login").await);
    assert!(!gate.check_page_access("/quick-add").await);
    assert_eq!(client.navigator.replaced(), vec!["/login".to_string()]);
}
