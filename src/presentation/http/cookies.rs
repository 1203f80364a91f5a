//! Auth cookies
//!
//! Provider tokens travel as `HttpOnly` cookies. The names are the ones the hosted
//! identity provider's browser client uses, so an existing browser login is honored.

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::CookieJar;

use crate::domain::AuthSession;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Refresh tokens outlive the access token; one week.
const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Token cookies present on a request. Empty values count as absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthCookies {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl AuthCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);
        let value = |name: &str| {
            jar.get(name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            access_token: value(ACCESS_TOKEN_COOKIE),
            refresh_token: value(REFRESH_TOKEN_COOKIE),
        }
    }
}

/// Append `Set-Cookie` headers carrying a freshly issued token pair.
pub fn set_session_cookies(headers: &mut HeaderMap, session: &AuthSession, secure: bool) {
    append(
        headers,
        cookie_string(ACCESS_TOKEN_COOKIE, &session.access_token, session.expires_in, secure),
    );
    append(
        headers,
        cookie_string(
            REFRESH_TOKEN_COOKIE,
            &session.refresh_token,
            REFRESH_TOKEN_MAX_AGE_SECS,
            secure,
        ),
    );
}

/// Append `Set-Cookie` headers expiring both token cookies.
pub fn clear_session_cookies(headers: &mut HeaderMap, secure: bool) {
    append(headers, cookie_string(ACCESS_TOKEN_COOKIE, "", 0, secure));
    append(headers, cookie_string(REFRESH_TOKEN_COOKIE, "", 0, secure));
}

fn cookie_string(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name,
        value,
        max_age.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn append(headers: &mut HeaderMap, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(_) => tracing::warn!("Refusing to set cookie with invalid characters"),
    }
}
