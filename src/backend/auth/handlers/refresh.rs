/**
 * Refresh and Logout Handlers
 *
 * POST /api/auth/refresh rotates a refresh token within its family;
 * POST /api/auth/logout revokes one without replacement.
 *
 * Replay of a consumed refresh token revokes the whole rotation family
 * inside the token service; the handler just surfaces the resulting error.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{RefreshRequest, TokenResponse};
use crate::backend::error::AuthError;
use crate::backend::server::state::AppState;

/// Refresh handler
///
/// # Errors
///
/// * `ReuseDetected` - the token was already consumed or is unknown; its
///   family has been revoked and the client must log in again
/// * `Expired` - the refresh token is past its validity window
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let pair = state.tokens.rotate(&request.refresh_token).await?;
    Ok(Json(TokenResponse::from(pair)))
}

/// Logout handler
///
/// Idempotent: revoking an unknown or already-consumed token still returns
/// 204 so clients can clear local state unconditionally.
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<StatusCode, AuthError> {
    state.tokens.revoke(&request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
