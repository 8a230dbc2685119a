/**
 * Federation Handlers
 *
 * POST /api/auth/federation/callback receives the verified profile from the
 * provider handshake and either opens a session (account matched) or hands
 * back a pending ticket. POST /api/auth/complete consumes that ticket with
 * the selected role and finishes registration.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::completion::parse_assignable_role;
use crate::backend::auth::federation::{FederatedProfile, FederationOutcome};
use crate::backend::auth::handlers::types::{
    AuthResponse, CompleteRequest, FederationCallbackResponse,
};
use crate::backend::error::AuthError;
use crate::backend::server::state::AppState;

/// Federation callback handler
///
/// The provider handshake has already been verified upstream; this handler
/// only reconciles the resulting profile against local accounts.
pub async fn federation_callback(
    State(state): State<AppState>,
    Json(profile): Json<FederatedProfile>,
) -> Result<Json<FederationCallbackResponse>, AuthError> {
    tracing::info!(
        "Federation callback from {} for subject {}",
        profile.provider,
        profile.subject
    );

    match state.federation.handle_callback(profile).await? {
        FederationOutcome::Matched(account) => {
            let pair = state.tokens.issue(account.id, account.role).await?;
            Ok(Json(FederationCallbackResponse::Session(AuthResponse::new(
                pair, account,
            ))))
        }
        FederationOutcome::Unmatched(ticket) => Ok(Json(
            FederationCallbackResponse::AwaitingCompletion {
                ticket_id: ticket.id,
                email: ticket.profile.email,
                display_name: ticket.profile.display_name,
            },
        )),
    }
}

/// Registration completion handler
///
/// # Errors
///
/// * `InvalidRole` / `MissingRoleFields` - bad role selection; the ticket
///   stays redeemable
/// * `InvalidTicket` - ticket unknown, expired, or already consumed
pub async fn complete_registration(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let role = parse_assignable_role(&request.role)?;
    let (account, pair) = state
        .completion
        .complete(request.ticket_id, role, &request.profile)
        .await?;
    Ok(Json(AuthResponse::new(pair, account)))
}
