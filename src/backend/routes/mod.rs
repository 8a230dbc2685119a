//! Routes Module
//!
//! Route configuration for the backend server.
//!
//! - `router`     - Top-level router assembly (gateway, fallback)
//! - `api_routes` - `/api` surface (auth, room event publishing)

pub mod api_routes;
pub mod router;

pub use router::create_router;
