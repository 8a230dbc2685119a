//! Authentication API integration tests
//!
//! End-to-end tests for signup, login, refresh rotation, logout, and the
//! current-account endpoint, running over the in-memory store.

mod common;

use axum::http::StatusCode;
use common::{signup_company, signup_junior, test_server};

#[tokio::test]
async fn test_signup_success() {
    let server = test_server();

    let body = signup_junior(&server, "dev@example.com").await;
    assert!(body.get("access_token").is_some());
    assert!(body.get("refresh_token").is_some());
    assert_eq!(body["account"]["email"], "dev@example.com");
    assert_eq!(body["account"]["role"], "junior");
    assert_eq!(body["account"]["junior_profile"]["experience_level"], "entry");
    assert!(body["account"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflict() {
    let server = test_server();
    signup_junior(&server, "dev@example.com").await;

    // Same email, different case
    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": "Dev@Example.com",
            "password": "password123",
            "role": "junior",
            "profile": { "experience_level": "entry", "skills": ["rust"] }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let server = test_server();

    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": "not-an-email",
            "password": "password123",
            "role": "junior",
            "profile": { "experience_level": "entry", "skills": ["rust"] }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": "dev@example.com",
            "password": "short",
            "role": "junior",
            "profile": { "experience_level": "entry", "skills": ["rust"] }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_rejects_admin_and_missing_fields() {
    let server = test_server();

    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": "dev@example.com",
            "password": "password123",
            "role": "admin"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "invalid_role");

    // Junior without required fields names the first missing one
    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": "dev@example.com",
            "password": "password123",
            "role": "junior"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "missing_role_fields");
    assert!(body["error"].as_str().unwrap().contains("experience_level"));
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let server = test_server();
    signup_company(&server, "acme@example.com").await;

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "acme@example.com",
            "password": "password123"
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["account"]["role"], "company");

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "acme@example.com",
            "password": "wrongpassword"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Unknown email is indistinguishable from a wrong password
    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "nobody@example.com",
            "password": "password123"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "invalid_credential");
}

#[tokio::test]
async fn test_refresh_rotation_and_replay() {
    let server = test_server();
    let signup = signup_junior(&server, "dev@example.com").await;
    let first = signup["refresh_token"].as_str().unwrap();

    let response = server
        .post("/api/auth/refresh")
        .json(&serde_json::json!({ "refresh_token": first }))
        .await;
    response.assert_status_ok();
    let rotated: serde_json::Value = response.json();
    let second = rotated["refresh_token"].as_str().unwrap();
    assert_ne!(first, second);

    // Replaying the consumed token revokes the family
    let response = server
        .post("/api/auth/refresh")
        .json(&serde_json::json!({ "refresh_token": first }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "reuse_detected");

    // The legitimate successor dies with the family
    let response = server
        .post("/api/auth/refresh")
        .json(&serde_json::json!({ "refresh_token": second }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let server = test_server();
    let signup = signup_junior(&server, "dev@example.com").await;
    let refresh = signup["refresh_token"].as_str().unwrap();

    let response = server
        .post("/api/auth/logout")
        .json(&serde_json::json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server
        .post("/api/auth/refresh")
        .json(&serde_json::json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Logout is idempotent
    let response = server
        .post("/api/auth/logout")
        .json(&serde_json::json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let server = test_server();
    let signup = signup_junior(&server, "dev@example.com").await;
    let access = signup["access_token"].as_str().unwrap();

    let response = server
        .get("/api/auth/me")
        .add_header("Authorization", format!("Bearer {access}"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], "dev@example.com");
    assert_eq!(body["role"], "junior");

    let response = server.get("/api/auth/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/auth/me")
        .add_header("Authorization", "Bearer not.a.token")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let server = test_server();
    let response = server.get("/api/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "not_found");
}
