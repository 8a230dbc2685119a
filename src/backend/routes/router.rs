/**
 * Router Configuration
 *
 * This module assembles the full Axum router.
 *
 * # Route Order
 *
 * 1. Gateway WebSocket endpoint (authenticates during the handshake)
 * 2. Public API routes (auth surface)
 * 3. Protected API routes (behind the auth middleware)
 * 4. Fallback handler (404 for everything else)
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing, Router,
};

use crate::backend::realtime::handle_gateway;
use crate::backend::routes::api_routes::{configure_public_routes, protected_routes};
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let router = Router::new().route("/gateway", routing::get(handle_gateway));
    let router = configure_public_routes(router);

    router
        .merge(protected_routes(state.clone()))
        .fallback(fallback_handler)
        .with_state(state)
}

/// Fallback handler for unmatched routes
async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not found",
            "code": "not_found",
            "status": 404
        })),
    )
}
