//! Route Guard Middleware
//!
//! Runs the [`RouteAuthorizer`] for every request. Public paths pass untouched;
//! denials become temporary redirects; authorized requests continue with the
//! caller's [`AdminContext`] in the extensions and leave with hardening headers.
//!
//! [`RouteAuthorizer`]: crate::application::services::RouteAuthorizer

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info};

use crate::application::services::RouteDecision;
use crate::infrastructure::metrics;
use crate::presentation::http::cookies::{set_session_cookies, AuthCookies};
use crate::startup::AppState;

pub async fn route_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let cookies = AuthCookies::from_headers(request.headers());

    let decision = state
        .authorizer
        .authorize(
            &path,
            cookies.access_token.as_deref(),
            cookies.refresh_token.as_deref(),
        )
        .await;

    match decision {
        RouteDecision::Public => next.run(request).await,
        RouteDecision::Redirect { location, reason } => {
            metrics::record_guard_decision(reason.as_str());
            if reason.is_authorization_failure() {
                info!(path = %path, reason = reason.as_str(), "Insufficient role");
            } else {
                debug!(path = %path, reason = reason.as_str(), "Redirecting to login");
            }
            Redirect::temporary(&location).into_response()
        }
        RouteDecision::Allow { admin, refreshed } => {
            metrics::record_guard_decision("allow");
            request.extensions_mut().insert(admin);

            let mut response = next.run(request).await;
            state.security_headers.apply(response.headers_mut());
            if let Some(session) = refreshed {
                set_session_cookies(
                    response.headers_mut(),
                    &session,
                    state.settings.server.secure_cookies,
                );
            }
            response
        }
    }
}
