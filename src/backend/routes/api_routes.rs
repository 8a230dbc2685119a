/**
 * API Route Handlers
 *
 * This module configures the `/api` surface.
 *
 * # Routes
 *
 * ## Authentication (public)
 * - `POST /api/auth/signup` - Password registration with role selection
 * - `POST /api/auth/login` - Password login
 * - `POST /api/auth/refresh` - Rotate a refresh token
 * - `POST /api/auth/logout` - Revoke a refresh token
 * - `POST /api/auth/federation/callback` - Verified federation profile
 * - `POST /api/auth/federation/complete` - Finish federated registration
 *
 * ## Protected (access token required)
 * - `GET /api/auth/me` - Current account
 * - `POST /api/rooms/{room_id}/events` - Publish a room event
 *
 * Protected routes sit behind `auth_middleware`; public routes carry no
 * token requirement (refresh/logout authenticate via the refresh token
 * in the body).
 */

use axum::{middleware, routing, Router};

use crate::backend::auth::handlers::{
    complete_registration, federation_callback, login, logout, me, refresh, signup,
};
use crate::backend::middleware::auth::auth_middleware;
use crate::backend::realtime::publish_room_event;
use crate::backend::server::state::AppState;

/// Configure public API routes
pub fn configure_public_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/auth/signup", routing::post(signup))
        .route("/api/auth/login", routing::post(login))
        .route("/api/auth/refresh", routing::post(refresh))
        .route("/api/auth/logout", routing::post(logout))
        .route(
            "/api/auth/federation/callback",
            routing::post(federation_callback),
        )
        .route(
            "/api/auth/federation/complete",
            routing::post(complete_registration),
        )
}

/// Build the protected API routes behind the auth middleware
pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", routing::get(me))
        .route(
            "/api/rooms/{room_id}/events",
            routing::post(publish_room_event),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
