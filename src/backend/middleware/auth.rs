/**
 * Authentication Middleware
 *
 * This module protects routes that require an authenticated account. It
 * extracts the bearer token from the Authorization header, verifies it via
 * the token service, and attaches the account identity to the request
 * extensions for handlers.
 *
 * Verification is purely the stateless access-token check: the role travels
 * in the claim, so no storage round-trip happens per request.
 */

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::accounts::Role;
use crate::backend::error::AuthError;
use crate::backend::server::state::AppState;

/// Authenticated account identity extracted from an access token
#[derive(Clone, Debug)]
pub struct AuthenticatedAccount {
    pub account_id: Uuid,
    pub role: Role,
}

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware
///
/// 1. Extracts the bearer token from the Authorization header
/// 2. Verifies it through the token service
/// 3. Attaches `AuthenticatedAccount` to request extensions
///
/// Missing or invalid tokens are rejected before the handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        AuthError::Unauthorized
    })?;

    let claims = state.tokens.verify_access(token)?;
    let account_id = claims.account_id()?;

    request
        .extensions_mut()
        .insert(AuthenticatedAccount { account_id, role: claims.role });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated account
///
/// Usable as a handler parameter on any route behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedAccount);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let account = parts
            .extensions
            .get::<AuthenticatedAccount>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedAccount not found in request extensions");
                AuthError::Unauthorized
            })?;

        Ok(AuthUser(account))
    }
}
