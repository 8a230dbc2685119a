/**
 * Login Handler
 *
 * This module implements password authentication for POST /api/auth/login.
 *
 * # Security
 *
 * Unknown email, wrong password, and federation-only account (no password
 * hash) are indistinguishable to the caller: all return the same invalid
 * credential error. The bcrypt comparison still runs against a burn hash
 * for unknown emails so the timing of the response does not reveal whether
 * the account exists.
 */

use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::error::AuthError;
use crate::backend::server::state::AppState;

/// Hash compared against when the email or password slot is absent, so
/// failed lookups cost the same as failed verifications
const BURN_HASH: &str = "$2b$12$K4sQzJ8mZxGKpVYl0e8LZeJ9yfXjW1bGvM3nR5tDcA7hS2uE6wO9i";

/// Login handler
///
/// # Errors
///
/// * `InvalidCredential` - unknown email, wrong password, or an account
///   that can only sign in through a federated provider
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    tracing::info!("Login request for email: {}", request.email);

    let account = state.store.find_account_by_email(&request.email).await?;
    let hash = account
        .as_ref()
        .and_then(|a| a.password_hash.as_deref())
        .unwrap_or(BURN_HASH);

    let verified = verify(&request.password, hash).unwrap_or(false);
    let (Some(account), true) = (account, verified) else {
        tracing::warn!("Failed login attempt for email: {}", request.email);
        return Err(AuthError::InvalidCredential);
    };

    let pair = state.tokens.issue(account.id, account.role).await?;
    tracing::info!("Login succeeded for account {}", account.id);
    Ok(Json(AuthResponse::new(pair, account)))
}
