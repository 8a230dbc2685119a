//! Shared Types
//!
//! Types shared between the server and its clients: room event structures
//! and the gateway wire frames exchanged over the realtime channel.

pub mod event;

pub use event::{ClientFrame, RoomEvent, RoomEventType, ServerFrame};
