//! Realtime Channel Gateway
//!
//! Authenticated, connection-oriented fan-out of project-room events.
//!
//! # Architecture
//!
//! - **`rooms`**   - The room membership registry: the only shared mutable
//!   resource, owned exclusively by the gateway and accessed solely through
//!   its join/leave/broadcast operations.
//! - **`gateway`** - The WebSocket handler: authenticates each connection at
//!   handshake time, then processes `join`/`leave` frames and forwards room
//!   events.
//! - **`publish`** - HTTP endpoint for domain-event producers (comment
//!   created/updated/deleted) to hand events to the gateway.
//!
//! # Delivery Semantics
//!
//! Best-effort, at-most-once. FIFO per member within a room; no ordering
//! across independent broadcast calls. A slow member drops its oldest
//! events and receives a `resync` frame; the broadcaster is never blocked
//! and delivery failures are never surfaced as errors.

pub mod gateway;
pub mod publish;
pub mod rooms;

pub use gateway::handle_gateway;
pub use publish::publish_room_event;
pub use rooms::RoomRegistry;
