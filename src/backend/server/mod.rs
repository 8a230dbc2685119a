//! Server Module
//!
//! Server assembly for the backend.
//!
//! - `config` - Environment configuration and database loading
//! - `state`  - `AppState` shared by every handler
//! - `init`   - Application wiring and background tasks

pub mod config;
pub mod init;
pub mod state;

pub use config::ServerConfig;
pub use init::{create_app, create_app_with_store};
pub use state::AppState;
