/**
 * Backend Error Types
 *
 * This module defines the error taxonomy for the identity subsystem.
 * Every error here is recoverable at the subsystem boundary and is returned
 * as a typed result to the calling layer; only storage unavailability is a
 * transient fault the caller should retry.
 *
 * # Security
 *
 * Credential failures are deliberately generic: bad password, bad signature
 * and malformed token all collapse into `InvalidCredential` so callers
 * cannot use the error as an oracle. Only a decoded-but-expired token is
 * distinguished (`Expired`), because that case is recoverable via refresh.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Errors produced by the identity and realtime subsystem
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad password or bad/malformed token. Always reported generically
    /// to avoid enumeration.
    #[error("invalid credentials")]
    InvalidCredential,

    /// Token past its validity window. Recoverable via refresh.
    #[error("credential expired")]
    Expired,

    /// A refresh token was presented after it had already been rotated.
    /// The whole token family is revoked; the user must re-authenticate.
    #[error("refresh token reuse detected")]
    ReuseDetected,

    /// Pending federation ticket is missing, expired, or already consumed.
    #[error("invalid or expired registration ticket")]
    InvalidTicket,

    /// Requested role is absent or not assignable.
    #[error("role `{0}` is not assignable")]
    InvalidRole(String),

    /// A required role-specific field is absent. Names the missing field.
    #[error("missing required field `{0}`")]
    MissingRoleFields(&'static str),

    /// Connection or room operation attempted without admission.
    #[error("unauthorized")]
    Unauthorized,

    /// Request input failed validation (e.g. malformed email, short password).
    #[error("{0}")]
    Validation(String),

    /// Resource already exists (e.g. email already registered).
    #[error("{0}")]
    Conflict(String),

    /// Storage is unavailable. Transient; the caller should retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `InvalidCredential` / `Expired` / `ReuseDetected` / `Unauthorized` - 401
    /// - `InvalidTicket` / `InvalidRole` / `Validation` - 400
    /// - `MissingRoleFields` - 422
    /// - `Conflict` - 409
    /// - `Unavailable` - 503
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredential | Self::Expired | Self::ReuseDetected | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidTicket | Self::InvalidRole(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingRoleFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Machine-readable error code used in JSON responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid_credential",
            Self::Expired => "expired",
            Self::ReuseDetected => "reuse_detected",
            Self::InvalidTicket => "invalid_ticket",
            Self::InvalidRole(_) => "invalid_role",
            Self::MissingRoleFields(_) => "missing_role_fields",
            Self::Unauthorized => "unauthorized",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}
