/**
 * Room Membership Registry
 *
 * This module owns room membership state for the realtime gateway. A room
 * is identified by a project id and exists only while at least one
 * connection is subscribed; nothing is persisted.
 *
 * # Concurrency
 *
 * The registry is the only shared mutable resource of the gateway. All
 * membership reads and writes happen under one mutex, so join/leave/
 * broadcast cannot lose updates when they race. Fan-out uses a bounded
 * `tokio::sync::broadcast` channel per room: `send` never blocks the
 * broadcaster, and a member that falls more than the channel capacity
 * behind drops its oldest events (surfaced to that member as a lag, which
 * the gateway turns into a resync flag).
 */

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::shared::RoomEvent;

/// Default per-room event buffer
pub const ROOM_CHANNEL_CAPACITY: usize = 256;

struct Room {
    sender: broadcast::Sender<RoomEvent>,
    members: HashSet<Uuid>,
}

/// Registry of room membership sets, owned by the gateway
///
/// Membership changes only through explicit `join`/`leave`; `leave_all`
/// runs when a connection closes.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
    capacity: usize,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_capacity(ROOM_CHANNEL_CAPACITY)
    }

    /// Create a registry with a custom per-room buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self { rooms: Mutex::new(HashMap::new()), capacity }
    }

    /// Subscribe a connection to a room's event stream
    ///
    /// Creates the room on first join. Returns the receiver the caller
    /// must drain; joining an already-joined room simply hands out a
    /// fresh receiver.
    pub fn join(&self, room_id: &str, conn_id: Uuid) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.entry(room_id.to_string()).or_insert_with(|| Room {
            sender: broadcast::channel(self.capacity).0,
            members: HashSet::new(),
        });
        room.members.insert(conn_id);
        tracing::debug!("Connection {} joined room {}", conn_id, room_id);
        room.sender.subscribe()
    }

    /// Remove a connection from a room
    ///
    /// The room is dropped once its last member leaves.
    pub fn leave(&self, room_id: &str, conn_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap();
        if let Some(room) = rooms.get_mut(room_id) {
            room.members.remove(&conn_id);
            if room.members.is_empty() {
                rooms.remove(room_id);
                tracing::debug!("Room {} is empty, dropping it", room_id);
            }
        }
    }

    /// Remove a connection from every room it belongs to
    pub fn leave_all(&self, conn_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap();
        rooms.retain(|room_id, room| {
            if room.members.remove(&conn_id) && room.members.is_empty() {
                tracing::debug!("Room {} is empty, dropping it", room_id);
                return false;
            }
            true
        });
    }

    /// Fan an event out to every current member of a room
    ///
    /// Returns the number of members the event was handed to (0 if the
    /// room does not exist). Never blocks; a member nobody is draining
    /// merely lags and is handled on its own connection.
    pub fn broadcast(&self, room_id: &str, event: RoomEvent) -> usize {
        let rooms = self.rooms.lock().unwrap();
        match rooms.get(room_id) {
            Some(room) => {
                // Ignore the no-receivers error; members may be tearing down
                let _ = room.sender.send(event);
                room.members.len()
            }
            None => {
                tracing::debug!("Broadcast to non-existent room {}", room_id);
                0
            }
        }
    }

    /// Whether a connection is currently a member of a room
    pub fn is_member(&self, room_id: &str, conn_id: Uuid) -> bool {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .get(room_id)
            .map(|room| room.members.contains(&conn_id))
            .unwrap_or(false)
    }

    /// Current member count of a room
    pub fn member_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(room_id).map(|room| room.members.len()).unwrap_or(0)
    }

    /// Number of live rooms
    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }

    /// Drop rooms whose channels have no live receivers left
    ///
    /// Defensive sweep for receivers dropped without a matching leave.
    pub fn sweep_idle(&self) {
        let mut rooms = self.rooms.lock().unwrap();
        rooms.retain(|_, room| !room.members.is_empty() && room.sender.receiver_count() > 0);
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
