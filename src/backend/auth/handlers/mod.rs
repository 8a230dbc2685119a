//! Auth HTTP Handlers
//!
//! Handlers for the `/api/auth` surface. Each handler translates between
//! JSON request/response types and the underlying services; all error
//! mapping goes through `AuthError`.

pub mod federation;
pub mod login;
pub mod me;
pub mod refresh;
pub mod signup;
pub mod types;

pub use federation::{complete_registration, federation_callback};
pub use login::login;
pub use me::me;
pub use refresh::{logout, refresh};
pub use signup::signup;
