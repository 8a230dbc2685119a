//! Backend Error Module
//!
//! Defines the error taxonomy for the identity and realtime subsystem and
//! its conversion into HTTP responses.
//!
//! - `types` - The `AuthError` enum and status code mapping
//! - `conversion` - `IntoResponse` implementation for Axum handlers

pub mod conversion;
pub mod types;

pub use types::AuthError;
