//! Common test utilities
//!
//! Spins up the application over the in-memory store with a known signing
//! secret, and provides account-creation helpers for the API tests.

#![allow(dead_code)]

use axum_test::TestServer;
use std::sync::Arc;

use talentlink::backend::auth::tokens::TokenConfig;
use talentlink::backend::routes::router::create_router;
use talentlink::backend::server::init::create_app_with_store;
use talentlink::backend::server::state::AppState;
use talentlink::backend::store::MemoryStore;

pub const TEST_SECRET: &str = "test-secret";

/// Test server over a fresh in-memory store
pub fn test_server() -> TestServer {
    let app = create_app_with_store(Arc::new(MemoryStore::new()), TokenConfig::new(TEST_SECRET));
    TestServer::new(app).unwrap()
}

/// Test server plus the state behind it, for tests that need to reach the
/// room registry or ticket store directly
pub fn test_server_with_state() -> (TestServer, AppState) {
    let state = AppState::new(Arc::new(MemoryStore::new()), TokenConfig::new(TEST_SECRET));
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state)
}

/// Like `test_server_with_state`, but bound to a real HTTP transport so
/// WebSocket upgrades work
pub fn test_ws_server_with_state() -> (TestServer, AppState) {
    let state = AppState::new(Arc::new(MemoryStore::new()), TokenConfig::new(TEST_SECRET));
    let server = TestServer::builder()
        .http_transport()
        .build(create_router(state.clone()))
        .unwrap();
    (server, state)
}

/// Register a junior account through the API, returning the auth response
pub async fn signup_junior(server: &TestServer, email: &str) -> serde_json::Value {
    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": email,
            "password": "password123",
            "role": "junior",
            "profile": {
                "experience_level": "entry",
                "skills": ["rust"]
            }
        }))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Register a company account through the API, returning the auth response
pub async fn signup_company(server: &TestServer, email: &str) -> serde_json::Value {
    let response = server
        .post("/api/auth/signup")
        .json(&serde_json::json!({
            "email": email,
            "password": "password123",
            "role": "company",
            "profile": {
                "company_name": "Acme",
                "industry": "fintech"
            }
        }))
        .await;
    response.assert_status_ok();
    response.json()
}
