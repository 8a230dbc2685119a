/**
 * Signup Handler
 *
 * This module implements password registration for POST /api/auth/signup.
 *
 * # Registration Process
 *
 * 1. Validate email format and password length
 * 2. Validate the requested role and its role-specific fields
 * 3. Hash the password using bcrypt
 * 4. Create the account (duplicate email is a conflict)
 * 5. Issue a token pair opening a fresh rotation family
 *
 * # Validation
 *
 * - Email must contain '@' (basic shape check; ownership is not verified)
 * - Password must be at least 8 characters long
 * - Role must be `junior` or `company`, with its required fields present
 *
 * Password accounts pick their role at registration, so no account ever
 * sits in the `unassigned` state on this path.
 */

use axum::{extract::State, response::Json};
use bcrypt::{hash, DEFAULT_COST};

use crate::backend::auth::accounts::Account;
use crate::backend::auth::completion::{build_profile, parse_assignable_role};
use crate::backend::auth::handlers::types::{AuthResponse, SignupRequest};
use crate::backend::error::AuthError;
use crate::backend::server::state::AppState;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Sign up handler
///
/// # Errors
///
/// * `Validation` - malformed email or too-short password
/// * `InvalidRole` / `MissingRoleFields` - bad role selection
/// * `Conflict` - an account with this email already exists
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    tracing::info!("Signup request for email: {}", request.email);

    if !request.email.contains('@') {
        return Err(AuthError::Validation("invalid email format".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = parse_assignable_role(&request.role)?;
    let (junior_profile, company_profile) = build_profile(role, &request.profile)?;

    let password_hash = hash(&request.password, DEFAULT_COST).map_err(|err| {
        tracing::error!("Password hashing failed: {}", err);
        AuthError::Unavailable("password hashing failed".to_string())
    })?;

    let mut account = Account::new(request.email, Some(password_hash), role);
    account.junior_profile = junior_profile;
    account.company_profile = company_profile;

    let account = state.store.create_account(account).await?;
    tracing::info!("Created account {} with role {}", account.id, account.role);

    let pair = state.tokens.issue(account.id, account.role).await?;
    Ok(Json(AuthResponse::new(pair, account)))
}
