//! Login Service
//!
//! Password sign-in for the admin console: throttle, authenticate with the identity
//! provider, confirm the identity is an active admin, then hand back tokens.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::services::{AdminDirectory, SessionError, SessionStore};
use crate::domain::{AuthSession, IdentityError, IdentityProvider, Role};
use crate::infrastructure::metrics;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::shared::error::AppError;
use crate::shared::sanitize::sanitize_for_log;

/// Login errors
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Too many login attempts, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not an active admin")]
    NotAdmin,

    #[error(transparent)]
    Identity(IdentityError),

    #[error(transparent)]
    Backend(#[from] AppError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<IdentityError> for LoginError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::Identity(other),
        }
    }
}

impl From<LoginError> for AppError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::RateLimited { retry_after_secs } => AppError::RateLimited {
                retry_after: retry_after_secs,
            },
            LoginError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".into())
            }
            LoginError::NotAdmin => AppError::Unauthorized("Admin access required".into()),
            LoginError::Identity(e) => AppError::Identity(e.to_string()),
            LoginError::Backend(e) => e,
            LoginError::Session(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session: AuthSession,
    pub role: Role,
}

#[derive(Clone)]
pub struct LoginService {
    limiter: RateLimiter,
    identity: Arc<dyn IdentityProvider>,
    directory: AdminDirectory,
}

impl LoginService {
    pub fn new(
        limiter: RateLimiter,
        identity: Arc<dyn IdentityProvider>,
        directory: AdminDirectory,
    ) -> Self {
        Self {
            limiter,
            identity,
            directory,
        }
    }

    #[instrument(skip(self, password), fields(email = %sanitize_for_log(email)))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginOutcome, LoginError> {
        let key = email.trim().to_lowercase();
        let email = sanitize_for_log(email);

        if !self.limiter.is_allowed(&key) {
            let retry_after_secs = self.limiter.remaining_time(&key);
            metrics::record_rate_limit_rejection("login");
            warn!(event = "rate_limit_exceeded", %email, retry_after_secs, "Login throttled");
            return Err(LoginError::RateLimited { retry_after_secs });
        }
        info!(event = "login_attempt", %email, "Login attempt");

        let session = match self.identity.sign_in_with_password(&key, password).await {
            Ok(session) => session,
            Err(e) => {
                warn!(event = "login_failed", %email, error = %e, "Login failed");
                return Err(e.into());
            }
        };

        let role = match self.directory.check_admin_role(&session.identity.email).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                warn!(event = "access_denied", %email, "Signed in but not an active admin");
                self.sign_out_quietly(&session).await;
                return Err(LoginError::NotAdmin);
            }
            Err(e) => {
                warn!(event = "login_failed", %email, error = %e, "Admin lookup failed");
                self.sign_out_quietly(&session).await;
                return Err(e.into());
            }
        };

        self.limiter.reset(&key);
        info!(event = "login_success", %email, %role, "Login succeeded");
        Ok(LoginOutcome { session, role })
    }

    /// [`authenticate`](Self::authenticate), then open the local session.
    pub async fn login(
        &self,
        store: &SessionStore,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, LoginError> {
        let outcome = self.authenticate(email, password).await?;
        let identity = &outcome.session.identity;
        store
            .create(&identity.user_id, &identity.email, outcome.role)
            .await?;
        Ok(outcome)
    }

    /// Tokens issued to a rejected caller are revoked, not just forgotten.
    async fn sign_out_quietly(&self, session: &AuthSession) {
        if let Err(e) = self.identity.revoke(&session.access_token).await {
            warn!(error = %e, "Token revocation failed");
        }
        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "Provider sign-out failed");
        }
    }
}
