/**
 * Server Initialization
 *
 * This module wires the application together: store selection, service
 * graph construction, router creation, and the periodic sweep task.
 *
 * # Initialization Process
 *
 * 1. Load configuration from the environment
 * 2. Connect to Postgres (falling back to the in-memory store)
 * 3. Build `AppState` with the full service graph
 * 4. Create the router
 * 5. Spawn the periodic sweep for expired tickets and idle rooms
 */

use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::auth::tokens::TokenConfig;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::{MemoryStore, PostgresStore, Store};

/// How often expired tickets and idle rooms are swept
const SWEEP_INTERVAL_SECS: u64 = 300;

/// Create and configure the Axum application from the environment
pub async fn create_app(config: &ServerConfig) -> Router {
    tracing::info!("Initializing talentlink backend server");

    let store: Arc<dyn Store> = match load_database().await {
        Some(pool) => Arc::new(PostgresStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    };

    create_app_with_store(store, config.tokens.clone())
}

/// Create the application over an explicit store and token configuration
///
/// Used directly by integration tests to run against the in-memory store
/// with a known signing secret.
pub fn create_app_with_store(store: Arc<dyn Store>, token_config: TokenConfig) -> Router {
    let state = AppState::new(store, token_config);
    let app = create_router(state.clone());

    // Periodic sweep: expired pending tickets and rooms whose receivers
    // vanished without a leave.
    let tickets = state.tickets.clone();
    let rooms = state.rooms.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            tickets.sweep_expired();
            rooms.sweep_idle();
            tracing::debug!("Swept expired tickets and idle rooms");
        }
    });

    tracing::info!("Router configured with periodic sweep task");
    app
}
