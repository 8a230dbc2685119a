//! TalentLink - Identity & Realtime Subsystem
//!
//! TalentLink is a marketplace connecting companies with junior developers.
//! This crate implements the part of the platform with real state-machine and
//! concurrency pressure: credential issuance and rotation, federated login
//! reconciliation, registration completion for role-less identities, and the
//! authenticated realtime channel gateway that fans out project-room events.
//!
//! # Module Structure
//!
//! The library is organized into two main modules:
//!
//! - **`shared`** - Types shared between the server and its clients
//!   - Room event structures and gateway wire frames
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server with auth and gateway handlers
//!   - Token service (access/refresh pairs, rotation families)
//!   - Identity federation broker and registration completion flow
//!   - Room registry and WebSocket event fan-out
//!   - Persistence contract with PostgreSQL and in-memory stores

pub mod backend;
pub mod shared;
