/**
 * Room Event Publishing
 *
 * HTTP endpoint through which domain-event producers hand comment events
 * to the gateway for fan-out. Publishing requires an authenticated account;
 * delivery itself stays best-effort and never fails the request.
 */

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::error::AuthError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::{RoomEvent, RoomEventType};

/// Request body for publishing an event into a room
#[derive(Debug, Deserialize)]
pub struct PublishEventRequest {
    /// One of `created`, `updated`, `deleted`
    #[serde(rename = "type")]
    pub event_type: RoomEventType,
    /// Opaque domain payload fanned out verbatim
    pub payload: serde_json::Value,
}

/// Response confirming a publish
#[derive(Debug, Serialize)]
pub struct PublishEventResponse {
    pub room_id: String,
    /// Members the event was handed to (0 when the room is empty)
    pub delivered: usize,
}

/// Publish a domain event to all members of a project room
///
/// `POST /api/rooms/{room_id}/events`. The originator receives its own
/// event back through the gateway like any other member.
pub async fn publish_room_event(
    State(state): State<AppState>,
    AuthUser(account): AuthUser,
    Path(room_id): Path<String>,
    Json(request): Json<PublishEventRequest>,
) -> Result<Json<PublishEventResponse>, AuthError> {
    let event = RoomEvent::new(request.event_type, room_id.clone(), request.payload);
    let delivered = state.rooms.broadcast(&room_id, event);

    tracing::info!(
        "Account {} published {} event to room {} ({} members)",
        account.account_id,
        request.event_type.as_str(),
        room_id,
        delivered
    );

    Ok(Json(PublishEventResponse { room_id, delivered }))
}
