/// End-to-end tests for registration, login, logout and the Auth Gate
///
/// Run against in-memory backends; no external services needed.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Utc;
use common::TestContext;
use futures::future::join_all;
use serde_json::json;
use tokoku_shared::{auth::token::Claims, store::CredentialStore};
use uuid::Uuid;

fn credentials(username: &str, password: &str) -> Option<serde_json::Value> {
    Some(json!({ "username": username, "password": password }))
}

#[tokio::test]
async fn test_register_login_scenario() {
    let ctx = TestContext::in_memory();

    let (user_id, token_a) = ctx.register("alice", "pw123").await;

    let (status, body) = ctx
        .send(Method::POST, "/api/v1/login", None, credentials("alice", "pw123"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token_b = body["token"].as_str().unwrap().to_string();
    assert!(body["expires_at"].as_i64().unwrap() > Utc::now().timestamp());

    assert_ne!(token_a, token_b);
    for token in [&token_a, &token_b] {
        let (status, body) = ctx
            .send(Method::GET, "/api/v1/secure-endpoint", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "You are authorized!");
        assert_eq!(body["user"]["user_id"], user_id);
    }

    let (status, body) = ctx
        .send(Method::POST, "/api/v1/login", None, credentials("alice", "wrongpw"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let ctx = TestContext::in_memory();
    let (user_id, _) = ctx.register("bob", "pw123").await;

    let user = ctx.state.credentials.find_by_id(user_id).await.unwrap().unwrap();
    assert_ne!(user.password_hash, "pw123");
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_duplicate_registration() {
    let ctx = TestContext::in_memory();
    ctx.register("alice", "pw123").await;

    let (status, body) = ctx
        .send(Method::POST, "/api/v1/register", None, credentials("alice", "other"))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_username");
    assert!(body.get("token").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_single_winner() {
    let ctx = TestContext::in_memory();

    let attempts = (0..8).map(|i| {
        ctx.send(
            Method::POST,
            "/api/v1/register",
            None,
            credentials("carol", &format!("pw-{}", i)),
        )
    });
    let results = join_all(attempts).await;

    let created = results.iter().filter(|(s, _)| *s == StatusCode::CREATED).count();
    let conflicts = results
        .iter()
        .filter(|(s, b)| *s == StatusCode::CONFLICT && b["error"] == "duplicate_username")
        .count();

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(ctx.memory_store().len().await, 1);
}

#[tokio::test]
async fn test_login_does_not_reveal_unknown_usernames() {
    let ctx = TestContext::in_memory();
    ctx.register("alice", "pw123").await;

    let unknown = ctx
        .send(Method::POST, "/api/v1/login", None, credentials("mallory", "pw123"))
        .await;
    let wrong_password = ctx
        .send(Method::POST, "/api/v1/login", None, credentials("alice", "nope"))
        .await;

    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong_password);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::in_memory();

    let (status, body) = ctx
        .send(Method::POST, "/api/v1/register", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["password", "username"]);

    let long_name = "x".repeat(101);
    let (status, _) = ctx
        .send(Method::POST, "/api/v1/register", None, credentials(&long_name, "pw"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(ctx.memory_store().is_empty().await);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::in_memory();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, body) = ctx.send_request(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_gate_rejects_missing_and_malformed_headers() {
    let ctx = TestContext::in_memory();
    let (_, token) = ctx.register("alice", "pw123").await;

    let (status, body) = ctx.send(Method::GET, "/api/v1/secure-endpoint", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
    assert_eq!(body["message"], "No token provided");

    for value in [
        format!("Token {}", token),
        format!("bearer {}", token),
        format!("Bearer {} extra", token),
        "Bearer".to_string(),
    ] {
        let request = Request::builder()
            .uri("/api/v1/secure-endpoint")
            .header(header::AUTHORIZATION, value.as_str())
            .body(Body::empty())
            .unwrap();
        let (status, body) = ctx.send_request(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", value);
        assert_eq!(body["error"], "unauthenticated");
    }
}

#[tokio::test]
async fn test_gate_rejects_bad_tokens_uniformly() {
    let ctx = TestContext::in_memory();
    let (user_id, token) = ctx.register("alice", "pw123").await;

    let mut tampered = token.clone().into_bytes();
    let middle = tampered.len() / 2;
    tampered[middle] = if tampered[middle] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let now = Utc::now().timestamp();
    let expired = ctx
        .tokens()
        .encode_claims(&Claims {
            sub: user_id.to_string(),
            iss: "tokoku".to_string(),
            iat: now - 7200,
            exp: Some(now - 3600),
            jti: Uuid::new_v4(),
        })
        .unwrap();

    let mut bodies = Vec::new();
    for bad in ["garbage", tampered.as_str(), expired.as_str()] {
        let (status, body) = ctx
            .send(Method::GET, "/api/v1/secure-endpoint", Some(bad), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        bodies.push(body);
    }

    assert_eq!(bodies[0]["error"], "unauthenticated");
    assert!(bodies.iter().all(|b| *b == bodies[0]));
}

#[tokio::test]
async fn test_logout_revokes_only_that_token() {
    let ctx = TestContext::in_memory();
    let (_, first) = ctx.register("alice", "pw123").await;

    let (_, body) = ctx
        .send(Method::POST, "/api/v1/login", None, credentials("alice", "pw123"))
        .await;
    let second = body["token"].as_str().unwrap().to_string();

    let (status, body) = ctx.send(Method::POST, "/api/v1/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");

    let (status, body) = ctx
        .send(Method::GET, "/api/v1/secure-endpoint", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = ctx.send(Method::POST, "/api/v1/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(Method::GET, "/api/v1/secure-endpoint", Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.revocations.len().await, 1);
}

#[tokio::test]
async fn test_protected_rechecks_subject() {
    let ctx = TestContext::in_memory();
    let (user_id, token) = ctx.register("alice", "pw123").await;

    let (status, body) = ctx.send(Method::GET, "/api/v1/protected", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id);
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("password_hash").is_none());

    assert!(ctx.memory_store().remove(user_id).await);

    let (status, body) = ctx.send(Method::GET, "/api/v1/protected", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_catalog_routes_are_gated() {
    let ctx = TestContext::in_memory();

    for (method, uri) in [
        (Method::GET, "/api/v1/categories"),
        (Method::POST, "/api/v1/suppliers"),
        (Method::PUT, "/api/v1/products/1"),
        (Method::DELETE, "/api/v1/orders/1"),
    ] {
        let (status, body) = ctx.send(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "unauthenticated");
    }
}

#[tokio::test]
async fn test_catalog_input_errors_before_storage() {
    let ctx = TestContext::in_memory();
    let (_, token) = ctx.register("alice", "pw123").await;

    let (status, body) = ctx
        .send(Method::GET, "/api/v1/products/abc", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = ctx
        .send(Method::POST, "/api/v1/categories", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/suppliers",
            Some(&token),
            Some(json!({ "name": "Acme", "email": "not-an-email" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_public_endpoints() {
    let ctx = TestContext::in_memory();

    for uri in ["/api/v1", "/api/v1/"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = tower::ServiceExt::oneshot(ctx.app.clone(), request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    }

    let (status, _) = ctx.send(Method::GET, "/api/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let ctx = TestContext::in_memory();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
