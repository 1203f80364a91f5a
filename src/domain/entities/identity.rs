//! Identity provider contract.
//!
//! The hosted auth service is the ground truth for whether a credential is live.
//! Everything here is what the rest of the crate needs from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Identity resolved by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

/// Token pair issued by the provider on sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub identity: Identity,
}

/// Auth state change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Identity provider errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    #[error("Malformed identity provider response: {0}")]
    Decode(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity behind the locally held provider session, if any is still live.
    async fn current_session(&self) -> Result<Option<Identity>, IdentityError>;

    /// Resolve an access token. `Ok(None)` means the token is not (or no longer) valid.
    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, IdentityError>;

    /// Revoke a specific access token.
    async fn revoke(&self, access_token: &str) -> Result<(), IdentityError>;

    /// End the locally held provider session and notify subscribers.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Subscribe to sign-in / sign-out notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
