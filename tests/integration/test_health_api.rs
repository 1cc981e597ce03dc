// Integration tests for health, metrics and internal error masking

use crate::common::*;
use axum::http::{header, Method, StatusCode};
use serde_json::json;
use std::sync::Arc;
use ticket_desk::api::responses::HealthResponse;

#[tokio::test]
async fn test_health_reports_connected_storage() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.storage, "connected");
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
}

#[tokio::test]
async fn test_health_stays_ok_when_storage_fails() {
    let (router, _) = router_for(Arc::new(FailingStore));
    let (status, _, body) = send_raw(&router, build_request(Method::GET, "/api/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.storage.starts_with("slow:"));
    assert!(!body.contains("secret"));
}

#[tokio::test]
async fn test_storage_failures_are_masked() {
    let (router, state) = router_for(Arc::new(FailingStore));
    let user = create_test_user("any@desk.test", &[ticket_desk::core::models::Role::Sdm], None);
    let token = state.tokens.mint_token(&user).unwrap();

    let (status, _, body) =
        send_raw(&router, build_request(Method::GET, "/api/tickets", Some(&token), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"], "Internal error");
    assert!(!body.contains("postgres"));

    let login = json!({"email": "any@desk.test", "password": "password123"}).to_string();
    let (status, _, body) =
        send_raw(&router, build_request(Method::POST, "/api/auth/login", None, Some(login))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("connection refused"));
}

#[tokio::test]
async fn test_metrics_exposition() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.fixture.client_sub);
    app.post("/api/tickets", Some(&token), json!({"title": "A", "description": "B"})).await;
    app.get(&format!("/api/tickets/{}", app.fixture.ticket_org2_tdm.id), Some(&token)).await;

    let (status, headers, body) =
        send_raw(&app.router, build_request(Method::GET, "/api/metrics", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert!(body.contains("ticket_desk_tickets_created_total 1"));
    assert!(body.contains("ticket_desk_policy_denials_total{operation=\"read\"} 1"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.fixture.client_sub);
    let description = "x".repeat(2 * 1024 * 1024);

    let (status, _) = app
        .post("/api/tickets", Some(&token), json!({"title": "A", "description": description}))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_storage_failure_during_auth_is_not_an_auth_failure() {
    let (router, state) = router_for(Arc::new(FailingStore));
    let user = create_test_user("any@desk.test", &[ticket_desk::core::models::Role::Sdm], None);
    let token = state.tokens.mint_token(&user).unwrap();

    let (status, _, _) =
        send_raw(&router, build_request(Method::GET, "/api/tickets", Some(&token), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.metrics.auth_failures.get(), 0);

    let (status, _, _) =
        send_raw(&router, build_request(Method::GET, "/api/tickets", Some("not-a-jwt"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.metrics.auth_failures.get(), 1);
}
