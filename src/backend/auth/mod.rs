//! Authentication and Identity Module
//!
//! Identity lifecycle for the marketplace backend.
//!
//! - `accounts`   - Account model, roles, provider links, role profiles
//! - `tokens`     - Access/refresh token issuance, verification, rotation
//! - `federation` - Reconciling verified federation profiles against accounts
//! - `completion` - Finalizing pending federated identities with a role
//! - `handlers`   - HTTP handlers for the auth API

pub mod accounts;
pub mod completion;
pub mod federation;
pub mod handlers;
pub mod tokens;
