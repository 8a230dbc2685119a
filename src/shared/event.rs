/**
 * Room Event System
 *
 * This module defines the event types carried over the realtime channel.
 * Domain mutations (comment created/updated/deleted) are broadcast to every
 * member of the owning project room, including the originator, so clients
 * can reconcile state from a single stream.
 */
use serde::{Deserialize, Serialize};

/// Type of domain event delivered to a room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomEventType {
    /// A comment was created
    Created,
    /// A comment was updated
    Updated,
    /// A comment was deleted
    Deleted,
}

impl RoomEventType {
    /// Wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomEventType::Created => "created",
            RoomEventType::Updated => "updated",
            RoomEventType::Deleted => "deleted",
        }
    }
}

/// Event broadcast to all members of a room
///
/// Delivery is best-effort and at-most-once. Ordering is FIFO per member
/// within one room; no ordering is guaranteed across independent broadcast
/// calls racing from different producers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEvent {
    /// Type of event
    #[serde(rename = "type")]
    pub event_type: RoomEventType,
    /// Room (project) the event belongs to
    pub room_id: String,
    /// Event payload (JSON-serializable data)
    pub payload: serde_json::Value,
    /// Timestamp when the event was broadcast (RFC3339)
    pub timestamp: String,
}

impl RoomEvent {
    /// Create a new room event
    pub fn new(event_type: RoomEventType, room_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            room_id: room_id.into(),
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a comment-created event
    pub fn created(room_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(RoomEventType::Created, room_id, payload)
    }

    /// Create a comment-updated event
    pub fn updated(room_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(RoomEventType::Updated, room_id, payload)
    }

    /// Create a comment-deleted event
    pub fn deleted(room_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(RoomEventType::Deleted, room_id, payload)
    }
}

/// Frame sent by a client over an admitted gateway connection
///
/// Room membership changes only through explicit `join`/`leave` frames,
/// never by inference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Subscribe this connection to a room's event stream
    Join { room: String },
    /// Unsubscribe this connection from a room
    Leave { room: String },
}

/// Frame sent by the server to a gateway connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake succeeded; room operations are now accepted
    Admitted,
    /// A room event this connection is subscribed to
    Event(RoomEvent),
    /// This connection fell behind and dropped events for `room`;
    /// the client should re-fetch room state
    Resync { room: String },
}
