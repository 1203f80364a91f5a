//! GoTrue-compatible identity provider client.
//!
//! Talks to the hosted auth REST API:
//!
//! | Operation        | Request                                              |
//! |------------------|------------------------------------------------------|
//! | get user         | `GET  /auth/v1/user` (bearer access token)            |
//! | password sign-in | `POST /auth/v1/token?grant_type=password`             |
//! | refresh          | `POST /auth/v1/token?grant_type=refresh_token`        |
//! | revoke           | `POST /auth/v1/logout` (bearer access token)          |
//!
//! With session persistence enabled (client use) the last sign-in is kept and
//! backs [`IdentityProvider::current_session`]. The edge disables persistence so one
//! caller's session is never visible to another.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::config::IdentitySettings;
use crate::domain::{AuthEvent, AuthSession, Identity, IdentityError, IdentityProvider};
use crate::shared::sanitize::sanitize_for_log;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl UserBody {
    fn into_identity(self) -> Identity {
        Identity {
            user_id: self.id,
            email: self.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserBody,
}

impl TokenBody {
    fn into_session(self) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            identity: self.user.into_identity(),
        }
    }
}

pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    anon_key: String,
    persist_session: bool,
    current: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpIdentityProvider {
    pub fn new(settings: &IdentitySettings) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
            persist_session: true,
            current: RwLock::new(None),
            events,
        })
    }

    /// Keep (or stop keeping) the last signed-in session.
    pub fn persist_session(mut self, persist: bool) -> Self {
        self.persist_session = persist;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn store_session(&self, session: &AuthSession) {
        if self.persist_session {
            *self.current.write() = Some(session.clone());
        }
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, IdentityError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(rejected(response).await);
        }

        let body: TokenBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(body.into_session())
    }
}

async fn rejected(response: reqwest::Response) -> IdentityError {
    let status = response.status().as_u16();
    let message = sanitize_for_log(&response.text().await.unwrap_or_default());
    IdentityError::Rejected { status, message }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_session(&self) -> Result<Option<Identity>, IdentityError> {
        let token = match self.current.read().as_ref() {
            Some(session) => session.access_token.clone(),
            None => return Ok(None),
        };

        let identity = self.get_user(&token).await?;
        if identity.is_none() {
            debug!("Stored provider session no longer valid");
            *self.current.write() = None;
        }
        Ok(identity)
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        let response = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejected(response).await);
        }

        let user: UserBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(Some(user.into_identity()))
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let session = self
            .token_request(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        self.store_session(&session);
        let _ = self.events.send(AuthEvent::SignedIn(session.identity.clone()));
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, IdentityError> {
        let session = self
            .token_request(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;
        self.store_session(&session);
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn revoke(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.url("/auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        // An already invalid token is as good as revoked.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let previous = self.current.write().take();
        let result = match previous {
            Some(session) => self.revoke(&session.access_token).await,
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!(error = %e, "Token revocation failed during sign-out");
        }
        // Local state is gone either way.
        let _ = self.events.send(AuthEvent::SignedOut);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
