//! Route guard tests against the full router.

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;

use quiz_admin_gate::domain::{AdminStatus, Role};

use crate::common::{
    body_json, location, set_cookies, FakeAdminRepository, FakeIdentityProvider, TestApp,
    MASTER_EMAIL,
};

fn app() -> TestApp {
    TestApp::new(
        FakeIdentityProvider::new()
            .with_token("admin-token", "admin@example.com")
            .with_token("master-token", MASTER_EMAIL)
            .with_token("inactive-token", "gone@example.com")
            .with_token("stranger-token", "stranger@example.com")
            .with_refresh_token("admin-refresh", "admin@example.com"),
        FakeAdminRepository::new()
            .with_admin("admin@example.com", Role::Admin, AdminStatus::Active)
            .with_admin(MASTER_EMAIL, Role::MasterAdmin, AdminStatus::Active)
            .with_admin("gone@example.com", Role::Admin, AdminStatus::Inactive),
    )
}

#[tokio::test]
async fn test_no_cookies_redirects_to_login_with_return_path() {
    let response = app().get("/dashboard", None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn test_login_page_is_public_and_echoes_local_redirect() {
    let app = app();

    let response = app.get("/login?redirect=%2Fdashboard", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"], "login");
    assert_eq!(body["redirect"], "/dashboard");

    let response = app.get("/login?redirect=%2F%2Fevil.example", None).await;
    let body = body_json(response).await;
    assert!(body.get("redirect").is_none());
}

#[tokio::test]
async fn test_authorized_page_gets_hardening_headers() {
    let response = app()
        .get("/dashboard", Some("sb-access-token=admin-token"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
    assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(
        headers.get(header::REFERRER_POLICY).unwrap(),
        "strict-origin-when-cross-origin"
    );
    assert_eq!(headers.get(header::X_XSS_PROTECTION).unwrap(), "1; mode=block");
    assert_eq!(
        headers.get("permissions-policy").unwrap(),
        "camera=(), microphone=(), geolocation=()"
    );

    let body = body_json(response).await;
    assert_eq!(body["email"], "admin@example.com");
    assert_eq!(body["role"], "admin");
    assert_eq!(body["path"], "/dashboard");
}

#[tokio::test]
async fn test_admin_on_master_only_path_goes_to_dashboard() {
    let response = app()
        .get("/admin-management", Some("sb-access-token=admin-token"))
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_master_admin_reaches_master_only_path() {
    let response = app()
        .get("/backup-export/run", Some("sb-access-token=master-token"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "master_admin");
    assert_eq!(body["master"], true);
}

#[tokio::test]
async fn test_inactive_or_unknown_admin_goes_to_plain_login() {
    let app = app();

    let response = app
        .get("/dashboard", Some("sb-access-token=inactive-token"))
        .await;
    assert_eq!(location(&response), "/login");

    let response = app
        .get("/dashboard", Some("sb-access-token=stranger-token"))
        .await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_invalid_token_keeps_return_path() {
    let response = app()
        .get("/team-setup", Some("sb-access-token=forged"))
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fteam-setup");
}

#[tokio::test]
async fn test_refresh_cookie_alone_is_exchanged() {
    let response = app()
        .get("/dashboard", Some("sb-refresh-token=admin-refresh"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("sb-access-token=at-user-admin;"));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[1].starts_with("sb-refresh-token=rt-user-admin;"));
}

#[tokio::test]
async fn test_provider_outage_fails_closed() {
    let app = app();
    app.identity.set_unavailable(true);

    let response = app
        .get("/dashboard", Some("sb-access-token=admin-token"))
        .await;
    assert_eq!(location(&response), "/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn test_backend_lookup_failure_fails_closed() {
    let app = app();
    app.admins.set_failing(true);

    let response = app
        .get("/dashboard", Some("sb-access-token=admin-token"))
        .await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_prefix_matching_is_per_segment() {
    let app = app();

    // Not under /api, so not protected: plain 404.
    let response = app.get("/apix", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/questions", None).await;
    assert_eq!(location(&response), "/login?redirect=%2Fapi%2Fquestions");
}

#[tokio::test]
async fn test_api_calls_carry_rate_limit_headers() {
    let response = app()
        .get("/api/questions", Some("sb-access-token=admin-token"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "100");
    assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "99");
}

#[tokio::test]
async fn test_search_budget_is_enforced() {
    let app = app();
    let cookie = Some("sb-access-token=admin-token");

    for _ in 0..30 {
        let response = app.get("/api/search?q=capital", cookie).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.get("/api/search?q=capital", cookie).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");

    let body = body_json(response).await;
    assert_eq!(body["code"], 10006);
    assert_eq!(body["rate_limit"]["limit"], 30);
}
