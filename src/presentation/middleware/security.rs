//! Security Headers
//!
//! Hardening headers attached to every response the route guard lets through,
//! so authorized admin pages are never cached, framed or sniffed.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

/// Security headers configuration
#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// Enable HSTS header (should only be true when using HTTPS)
    pub enable_hsts: bool,
    /// HSTS max-age in seconds (default: 31536000 = 1 year)
    pub hsts_max_age: u64,
    /// Referrer-Policy value
    pub referrer_policy: String,
    /// Permissions-Policy value
    pub permissions_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enable_hsts: false,
            hsts_max_age: 31536000,
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            permissions_policy: "camera=(), microphone=(), geolocation=()".to_string(),
        }
    }
}

impl SecurityHeadersConfig {
    /// HSTS follows whether cookies are marked `Secure`.
    pub fn for_https(enabled: bool) -> Self {
        Self {
            enable_hsts: enabled,
            ..Default::default()
        }
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        );

        if let Ok(value) = HeaderValue::from_str(&self.referrer_policy) {
            headers.insert(header::REFERRER_POLICY, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.permissions_policy) {
            headers.insert(HeaderName::from_static("permissions-policy"), value);
        }

        if self.enable_hsts {
            if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", self.hsts_max_age)) {
                headers.insert(header::STRICT_TRANSPORT_SECURITY, value);
            }
        }
    }
}
