//! Rate Limiting Middleware
//!
//! Applies the in-process fixed-window budgets to API traffic. Denials reply `429`
//! with `Retry-After` and the `X-RateLimit-*` headers.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::services::AdminContext;
use crate::infrastructure::metrics;
use crate::infrastructure::rate_limit::{RateLimitInfo, RateLimiter};
use crate::shared::error::ErrorResponse;
use crate::startup::AppState;

/// Which budget a route draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    /// Search endpoints
    Search,
    /// Every other API endpoint
    Api,
}

impl EndpointType {
    fn limiter(self, state: &AppState) -> &RateLimiter {
        match self {
            EndpointType::Search => &state.limiters.search,
            EndpointType::Api => &state.limiters.api,
        }
    }

    fn key_prefix(self) -> &'static str {
        match self {
            EndpointType::Search => "rl:search",
            EndpointType::Api => "rl:api",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            EndpointType::Search => "search",
            EndpointType::Api => "api",
        }
    }
}

/// Rate limit exceeded error response.
#[derive(Debug, Serialize)]
struct RateLimitExceededResponse {
    #[serde(flatten)]
    error: ErrorResponse,
    rate_limit: RateLimitInfo,
}

/// Extract the rate limit identifier from a request.
///
/// Priority:
/// 1. Authorized admin (set by the route guard)
/// 2. X-Forwarded-For header (first hop)
/// 3. X-Real-IP header
/// 4. Connection address
fn extract_identifier(request: &Request, client_ip: Option<IpAddr>) -> String {
    if let Some(admin) = request.extensions().get::<AdminContext>() {
        return format!("admin:{}", admin.email.to_lowercase());
    }
    identifier_from_headers(request.headers(), client_ip)
}

fn identifier_from_headers(headers: &HeaderMap, client_ip: Option<IpAddr>) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first_ip) = forwarded_for.split(',').next() {
            let ip = first_ip.trim();
            if ip.parse::<IpAddr>().is_ok() {
                return format!("ip:{}", ip);
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        if real_ip.trim().parse::<IpAddr>().is_ok() {
            return format!("ip:{}", real_ip.trim());
        }
    }

    match client_ip {
        Some(ip) => format!("ip:{}", ip),
        None => {
            tracing::warn!("Could not determine client identifier for rate limiting");
            "ip:unknown".to_string()
        }
    }
}

/// Rate limiting middleware for search endpoints.
pub async fn rate_limit_search(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, EndpointType::Search).await
}

/// Rate limiting middleware for standard API endpoints.
pub async fn rate_limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, EndpointType::Api).await
}

async fn rate_limit_inner(
    state: AppState,
    request: Request,
    next: Next,
    endpoint_type: EndpointType,
) -> Response {
    // Present when served with `into_make_service_with_connect_info`.
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let key = format!(
        "{}:{}",
        endpoint_type.key_prefix(),
        extract_identifier(&request, client_ip)
    );
    let limiter = endpoint_type.limiter(&state);

    if limiter.is_allowed(&key) {
        let info = limiter.status(&key);
        let mut response = next.run(request).await;
        add_rate_limit_headers(response.headers_mut(), &info);
        response
    } else {
        metrics::record_rate_limit_rejection(endpoint_type.as_str());
        tracing::warn!(
            event = "rate_limit_exceeded",
            key = %key,
            endpoint_type = endpoint_type.as_str(),
            "Rate limit exceeded"
        );
        create_rate_limit_response(limiter.status(&key))
    }
}

/// Add rate limit headers to a response.
fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    if let Ok(v) = HeaderValue::from_str(&info.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&info.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&info.reset_at.to_string()) {
        headers.insert("X-RateLimit-Reset", v);
    }
}

/// Create a 429 Too Many Requests response.
fn create_rate_limit_response(info: RateLimitInfo) -> Response {
    let info = RateLimitInfo {
        remaining: 0,
        ..info
    };
    let body = RateLimitExceededResponse {
        error: ErrorResponse {
            code: 10006,
            message: "Too many requests. Please try again later.".to_string(),
            retry_after: Some(info.retry_after),
        },
        rate_limit: info,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(&body)).into_response();
    if let Ok(v) = HeaderValue::from_str(&body.rate_limit.retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, v);
    }
    add_rate_limit_headers(response.headers_mut(), &body.rate_limit);
    response
}
