//! Authentication Handlers

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::application::dto::{LoginRequest, LoginResponse, LogoutResponse};
use crate::presentation::http::cookies::{clear_session_cookies, set_session_cookies, AuthCookies};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Sign in with email and password. Tokens are returned as cookies only.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = state.login.authenticate(&body.email, &body.password).await?;

    let response = LoginResponse {
        email: outcome.session.identity.email.clone(),
        role: outcome.role,
        expires_in: outcome.session.expires_in,
    };
    let mut response = Json(response).into_response();
    set_session_cookies(
        response.headers_mut(),
        &outcome.session,
        state.settings.server.secure_cookies,
    );
    Ok(response)
}

/// Revoke the access token (best effort) and expire both cookies.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookies = AuthCookies::from_headers(&headers);
    if let Some(token) = cookies.access_token.as_deref() {
        if let Err(e) = state.identity.revoke(token).await {
            tracing::warn!(error = %e, "Token revocation failed during logout");
        }
    }
    tracing::info!(event = "logout", "Signed out");

    let mut response = Json(LogoutResponse { signed_out: true }).into_response();
    clear_session_cookies(response.headers_mut(), state.settings.server.secure_cookies);
    response
}
