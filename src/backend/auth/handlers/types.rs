/**
 * Auth Request/Response Types
 *
 * This module defines the JSON types for the auth API surface. Accounts are
 * serialized through the `Account` model itself, which never exposes the
 * password hash.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::accounts::Account;
use crate::backend::auth::completion::RoleFields;
use crate::backend::auth::tokens::TokenPair;

/// Request body for POST /api/auth/signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// Requested role: `junior` or `company`
    pub role: String,
    /// Role-specific fields, validated against the requested role
    #[serde(default)]
    pub profile: RoleFields,
}

/// Request body for POST /api/auth/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for POST /api/auth/refresh and /api/auth/logout
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for POST /api/auth/complete
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    /// Pending ticket returned by the federation callback
    pub ticket_id: Uuid,
    /// Selected role: `junior` or `company`
    pub role: String,
    #[serde(default)]
    pub profile: RoleFields,
}

/// Response carrying a token pair and the authenticated account
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub account: Account,
}

impl AuthResponse {
    pub fn new(pair: TokenPair, account: Account) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            account,
        }
    }
}

/// Response for POST /api/auth/refresh (no account body; the client
/// already holds it)
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Response for POST /api/auth/federation/callback
///
/// Tagged by `status`: an existing account yields a session directly, an
/// unknown identity yields a pending ticket for the completion flow.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FederationCallbackResponse {
    /// Account matched; a session was opened
    Session(AuthResponse),
    /// No account yet; complete registration with this ticket
    AwaitingCompletion {
        ticket_id: Uuid,
        email: String,
        display_name: String,
    },
}
