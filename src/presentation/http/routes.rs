//! Route Configuration
//!
//! Every request passes the route guard first. The guard decides from the path
//! alone whether credentials are needed, so unknown protected paths still redirect
//! to login rather than 404.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{rate_limit_api, rate_limit_search, route_guard};
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let login_path = state.settings.routes.login_path.clone();

    Router::new()
        .nest("/api", api_routes(state.clone()))
        .nest("/auth", auth_routes())
        .route(&login_path, get(handlers::pages::login_page))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Console pages
        .fallback(handlers::pages::protected_page)
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// Sign-in and sign-out. The login budget is consumed inside the login service,
/// keyed by email.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
}

/// API routes (protected by the guard, throttled here)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/search",
            get(handlers::pages::search).route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_search,
            )),
        )
        .route(
            "/{*rest}",
            get(handlers::pages::protected_page)
                .route_layer(middleware::from_fn_with_state(state, rate_limit_api)),
        )
}
