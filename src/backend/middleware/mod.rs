//! Middleware Module
//!
//! Request middleware for the backend server.
//!
//! - `auth` - Bearer token verification and the `AuthUser` extractor

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedAccount};
