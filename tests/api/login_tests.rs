//! Login and logout endpoint tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::json;

use quiz_admin_gate::domain::{AdminStatus, Role};

use crate::common::{
    body_json, location, set_cookies, FakeAdminRepository, FakeIdentityProvider, TestApp,
    MASTER_EMAIL,
};

fn app() -> TestApp {
    TestApp::new(
        FakeIdentityProvider::new()
            .with_account("admin@example.com", "correct horse")
            .with_account("player@example.com", "hunter22")
            .with_account(MASTER_EMAIL, "master pass"),
        FakeAdminRepository::new().with_admin("admin@example.com", Role::Admin, AdminStatus::Active),
    )
}

#[tokio::test]
async fn test_login_sets_cookies_and_opens_protected_pages() {
    let app = app();

    let response = app
        .post_json(
            "/auth/login",
            json!({ "email": "admin@example.com", "password": "correct horse" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("sb-access-token=at-user-admin;"));
    assert!(cookies[0].contains("Max-Age=3600"));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Lax"));

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({ "email": "admin@example.com", "role": "admin", "expires_in": 3600 })
    );

    let page = app
        .get("/dashboard", Some("sb-access-token=at-user-admin"))
        .await;
    assert_eq!(page.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sixth_failed_attempt_is_rate_limited() {
    let app = app();
    let attempt = json!({ "email": "admin@example.com", "password": "wrong" });

    for _ in 0..5 {
        let response = app.post_json("/auth/login", attempt.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app.post_json("/auth/login", attempt.clone()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "900");

    // The budget is per email, and the right password does not bypass it.
    let response = app
        .post_json(
            "/auth/login",
            json!({ "email": "admin@example.com", "password": "correct horse" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Fifteen minutes later the window has reset.
    app.clock.advance_millis(900_001);
    let response = app
        .post_json(
            "/auth/login",
            json!({ "email": "admin@example.com", "password": "correct horse" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_admin_account_is_rejected_and_signed_out() {
    let app = app();

    let response = app
        .post_json(
            "/auth/login",
            json!({ "email": "player@example.com", "password": "hunter22" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(*app.identity.sign_outs.lock(), 1);
}

#[tokio::test]
async fn test_master_email_logs_in_without_admin_row() {
    let response = app()
        .post_json(
            "/auth/login",
            json!({ "email": MASTER_EMAIL, "password": "master pass" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "master_admin");
}

#[tokio::test]
async fn test_malformed_email_is_a_validation_error() {
    let response = app()
        .post_json(
            "/auth/login",
            json!({ "email": "not-an-email", "password": "x" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 10007);
}

#[tokio::test]
async fn test_logout_revokes_and_clears_cookies() {
    let app = app();
    app.post_json(
        "/auth/login",
        json!({ "email": "admin@example.com", "password": "correct horse" }),
    )
    .await;

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, "sb-access-token=at-user-admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    assert_eq!(*app.identity.revoked.lock(), vec!["at-user-admin".to_string()]);

    let page = app
        .get("/dashboard", Some("sb-access-token=at-user-admin"))
        .await;
    assert_eq!(location(&page), "/login?redirect=%2Fdashboard");
}
