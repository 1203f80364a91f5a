//! Route Authorizer
//!
//! Edge-side decision for one request. Stateless: every request re-validates the
//! access token with the identity provider and re-reads the caller's `admins` row,
//! independently of whatever the client-side gate concluded.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{AdminRepository, AuthSession, Identity, IdentityProvider, Role, RoutePolicy};
use crate::shared::sanitize::sanitize_for_log;

/// Authorized caller, attached to the request for downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminContext {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Neither token cookie present
    MissingCredentials,
    /// Provider did not resolve an identity
    InvalidToken,
    /// Provider call failed
    ProviderError,
    /// No `admins` row for the identity
    NotAdmin,
    /// `admins` row is not active
    Inactive,
    /// `admins` lookup failed
    LookupFailed,
    /// Authenticated admin without the master tier on a master-only path
    InsufficientRole,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidToken => "invalid_token",
            Self::ProviderError => "provider_error",
            Self::NotAdmin => "not_admin",
            Self::Inactive => "inactive",
            Self::LookupFailed => "lookup_failed",
            Self::InsufficientRole => "insufficient_role",
        }
    }

    /// Authorization failures go to the dashboard; everything else is authentication.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::InsufficientRole)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Path is not protected; forward untouched.
    Public,
    /// Forward with hardening headers. `refreshed` carries new tokens when the
    /// refresh cookie had to be exchanged.
    Allow {
        admin: AdminContext,
        refreshed: Option<AuthSession>,
    },
    Redirect {
        location: String,
        reason: DenyReason,
    },
}

#[derive(Clone)]
pub struct RouteAuthorizer {
    identity: Arc<dyn IdentityProvider>,
    admins: Arc<dyn AdminRepository>,
    policy: RoutePolicy,
}

impl RouteAuthorizer {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        admins: Arc<dyn AdminRepository>,
        policy: RoutePolicy,
    ) -> Self {
        Self {
            identity,
            admins,
            policy,
        }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub async fn authorize(
        &self,
        path: &str,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> RouteDecision {
        if !self.policy.is_protected(path) {
            return RouteDecision::Public;
        }

        let access_token = access_token.filter(|t| !t.is_empty());
        let refresh_token = refresh_token.filter(|t| !t.is_empty());
        if access_token.is_none() && refresh_token.is_none() {
            return self.to_login_returning(path, DenyReason::MissingCredentials);
        }

        let (identity, refreshed) = match self.resolve_identity(access_token, refresh_token).await {
            Ok(resolved) => resolved,
            Err(reason) => return self.to_login_returning(path, reason),
        };

        let record = match self.admins.find_by_email(&identity.email).await {
            Ok(Some(record)) => record,
            Ok(None) => return self.to_login(&identity, DenyReason::NotAdmin),
            Err(e) => {
                warn!(error = %e, "Admin lookup failed");
                return self.to_login(&identity, DenyReason::LookupFailed);
            }
        };
        if !record.is_active() {
            return self.to_login(&identity, DenyReason::Inactive);
        }

        if self.policy.is_master_only(path) && !record.role.is_master() {
            debug!(email = %sanitize_for_log(&identity.email), path, "Master-only path denied");
            return RouteDecision::Redirect {
                location: self.policy.dashboard_path().to_string(),
                reason: DenyReason::InsufficientRole,
            };
        }

        RouteDecision::Allow {
            admin: AdminContext {
                user_id: identity.user_id,
                email: identity.email,
                role: record.role,
            },
            refreshed,
        }
    }

    async fn resolve_identity(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(Identity, Option<AuthSession>), DenyReason> {
        if let Some(token) = access_token {
            match self.identity.get_user(token).await {
                Ok(Some(identity)) => return Ok((identity, None)),
                Ok(None) if refresh_token.is_some() => {}
                Ok(None) => return Err(DenyReason::InvalidToken),
                Err(e) => {
                    warn!(error = %e, "Access token validation failed");
                    return Err(DenyReason::ProviderError);
                }
            }
        }

        let Some(refresh_token) = refresh_token else {
            return Err(DenyReason::InvalidToken);
        };
        match self.identity.refresh_session(refresh_token).await {
            Ok(session) => Ok((session.identity.clone(), Some(session))),
            Err(e) => {
                debug!(error = %e, "Refresh token exchange failed");
                Err(DenyReason::InvalidToken)
            }
        }
    }

    fn to_login_returning(&self, path: &str, reason: DenyReason) -> RouteDecision {
        RouteDecision::Redirect {
            location: self.policy.login_redirect(path),
            reason,
        }
    }

    fn to_login(&self, identity: &Identity, reason: DenyReason) -> RouteDecision {
        warn!(
            email = %sanitize_for_log(&identity.email),
            reason = reason.as_str(),
            "Access denied: not an active admin"
        );
        RouteDecision::Redirect {
            location: self.policy.login_path().to_string(),
            reason,
        }
    }
}
