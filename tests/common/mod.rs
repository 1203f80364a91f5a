//! Common Test Utilities
//!
//! In-memory fakes for the identity provider and the `admins` table, plus a
//! `TestApp` wrapping the real router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tower::ServiceExt;

use quiz_admin_gate::application::services::Navigator;
use quiz_admin_gate::config::{
    CorsSettings, DatabaseSettings, IdentitySettings, RateLimitSettings, RouteSettings,
    ServerSettings, SessionSettings, Settings,
};
use quiz_admin_gate::domain::{
    AdminRecord, AdminRepository, AdminStatus, AuthEvent, AuthSession, Identity, IdentityError,
    IdentityProvider, Role,
};
use quiz_admin_gate::shared::clock::ManualClock;
use quiz_admin_gate::shared::error::AppError;
use quiz_admin_gate::startup::AppState;

pub const MASTER_EMAIL: &str = "master@example.com";

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
            secure_cookies: false,
        },
        database: DatabaseSettings {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
        },
        identity: IdentitySettings {
            url: "http://identity.invalid".into(),
            anon_key: "anon".into(),
            request_timeout_secs: 1,
        },
        session: SessionSettings::default(),
        rate_limit: RateLimitSettings::default(),
        routes: RouteSettings::default(),
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into()],
        },
        master_admin_email: Some(MASTER_EMAIL.into()),
        environment: "test".into(),
    }
}

/// Identity provider backed by in-memory tables.
pub struct FakeIdentityProvider {
    /// access token -> identity
    tokens: Mutex<HashMap<String, Identity>>,
    /// refresh token -> identity
    refresh_tokens: Mutex<HashMap<String, Identity>>,
    /// email -> (password, user id)
    accounts: Mutex<HashMap<String, (String, String)>>,
    current: Mutex<Option<Identity>>,
    unavailable: Mutex<bool>,
    pub sign_outs: Mutex<u32>,
    pub revoked: Mutex<Vec<String>>,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            tokens: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            unavailable: Mutex::new(false),
            sign_outs: Mutex::new(0),
            revoked: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn with_token(self, token: &str, email: &str) -> Self {
        self.tokens
            .lock()
            .insert(token.to_string(), identity_for(email));
        self
    }

    pub fn with_refresh_token(self, token: &str, email: &str) -> Self {
        self.refresh_tokens
            .lock()
            .insert(token.to_string(), identity_for(email));
        self
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.accounts.lock().insert(
            email.to_string(),
            (password.to_string(), identity_for(email).user_id),
        );
        self
    }

    pub fn with_current(self, email: &str) -> Self {
        *self.current.lock() = Some(identity_for(email));
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    fn check_available(&self) -> Result<(), IdentityError> {
        if *self.unavailable.lock() {
            return Err(IdentityError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn issue(&self, identity: Identity) -> AuthSession {
        let access_token = format!("at-{}", identity.user_id);
        let refresh_token = format!("rt-{}", identity.user_id);
        self.tokens
            .lock()
            .insert(access_token.clone(), identity.clone());
        AuthSession {
            access_token,
            refresh_token,
            expires_in: 3600,
            identity,
        }
    }
}

pub fn identity_for(email: &str) -> Identity {
    Identity {
        user_id: format!("user-{}", email.split('@').next().unwrap_or(email)),
        email: email.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn current_session(&self) -> Result<Option<Identity>, IdentityError> {
        self.check_available()?;
        Ok(self.current.lock().clone())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        self.check_available()?;
        Ok(self.tokens.lock().get(access_token).cloned())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        self.check_available()?;
        let known = self.accounts.lock().get(email).cloned();
        match known {
            Some((expected, _)) if expected == password => {
                let session = self.issue(identity_for(email));
                *self.current.lock() = Some(session.identity.clone());
                self.emit(AuthEvent::SignedIn(session.identity.clone()));
                Ok(session)
            }
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, IdentityError> {
        self.check_available()?;
        let identity = self.refresh_tokens.lock().get(refresh_token).cloned();
        match identity {
            Some(identity) => Ok(self.issue(identity)),
            None => Err(IdentityError::Rejected {
                status: 400,
                message: "invalid refresh token".into(),
            }),
        }
    }

    async fn revoke(&self, access_token: &str) -> Result<(), IdentityError> {
        self.tokens.lock().remove(access_token);
        self.revoked.lock().push(access_token.to_string());
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *self.current.lock() = None;
        *self.sign_outs.lock() += 1;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// `admins` table in a map.
#[derive(Default)]
pub struct FakeAdminRepository {
    rows: Mutex<HashMap<String, AdminRecord>>,
    failing: Mutex<bool>,
}

impl FakeAdminRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(self, email: &str, role: Role, status: AdminStatus) -> Self {
        self.rows.lock().insert(
            email.to_string(),
            AdminRecord {
                email: email.to_string(),
                role,
                status,
            },
        );
        self
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl AdminRepository for FakeAdminRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, AppError> {
        if *self.failing.lock() {
            return Err(AppError::Internal("admins lookup failed".into()));
        }
        Ok(self.rows.lock().get(email).cloned())
    }

    async fn ping(&self) -> Result<(), AppError> {
        if *self.failing.lock() {
            return Err(AppError::Internal("database unreachable".into()));
        }
        Ok(())
    }
}

/// Navigation log for gate tests.
#[derive(Default)]
pub struct RecordingNavigator {
    pub pushed: Mutex<Vec<String>>,
    pub replaced: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn pushed(&self) -> Vec<String> {
        self.pushed.lock().clone()
    }

    pub fn replaced(&self) -> Vec<String> {
        self.replaced.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.pushed.lock().push(path.to_string());
    }

    fn replace(&self, path: &str) {
        self.replaced.lock().push(path.to_string());
    }
}

/// Test application wrapping the real router over fakes.
pub struct TestApp {
    pub router: Router,
    pub identity: Arc<FakeIdentityProvider>,
    pub admins: Arc<FakeAdminRepository>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new(identity: FakeIdentityProvider, admins: FakeAdminRepository) -> Self {
        Self::with_settings(test_settings(), identity, admins)
    }

    pub fn with_settings(
        settings: Settings,
        identity: FakeIdentityProvider,
        admins: FakeAdminRepository,
    ) -> Self {
        let identity = Arc::new(identity);
        let admins = Arc::new(admins);
        let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
        let state = AppState::new(settings, identity.clone(), admins.clone(), clock.clone());

        Self {
            router: state.into_router(),
            identity,
            admins,
            clock,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// GET with an optional `Cookie` header.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
