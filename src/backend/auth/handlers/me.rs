/**
 * Current Account Handler
 *
 * GET /api/auth/me returns the account behind the presented access token.
 * Sits behind the auth middleware; the storage lookup refreshes role and
 * profile data that may have changed since the token was issued.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::accounts::Account;
use crate::backend::error::AuthError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// Current account handler
///
/// # Errors
///
/// * `Unauthorized` - the token's account no longer exists
pub async fn me(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Account>, AuthError> {
    let account = state
        .store
        .find_account_by_id(auth.account_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token presented for deleted account {}", auth.account_id);
            AuthError::Unauthorized
        })?;

    Ok(Json(account))
}
