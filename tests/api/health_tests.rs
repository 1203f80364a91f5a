//! Health and metrics endpoint tests.

use axum::http::StatusCode;

use crate::common::{body_json, FakeAdminRepository, FakeIdentityProvider, TestApp};

fn app() -> TestApp {
    TestApp::new(FakeIdentityProvider::new(), FakeAdminRepository::new())
}

#[tokio::test]
async fn test_health_and_liveness() {
    let app = app();

    let body = body_json(app.get("/health", None).await).await;
    assert_eq!(body["status"], "healthy");

    let body = body_json(app.get("/health/live", None).await).await;
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_follows_backend() {
    let app = app();

    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.admins.set_failing(true);
    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["database"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_report_guard_decisions() {
    let app = app();
    app.get("/dashboard", None).await;

    let response = app.get("/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("quiz_gate_guard_decisions_total"));
}
