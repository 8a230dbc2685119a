//! Backend Module
//!
//! Server-side implementation of the identity and realtime subsystem.
//!
//! - `auth`       - Accounts, tokens, federation, registration completion
//! - `error`      - The `AuthError` taxonomy and HTTP mapping
//! - `middleware` - Bearer token verification
//! - `realtime`   - WebSocket gateway and room registry
//! - `routes`     - Route configuration
//! - `server`     - State, configuration, and initialization
//! - `store`      - The storage contract with Postgres and in-memory backends

pub mod auth;
pub mod error;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod store;
