/**
 * Application State Management
 *
 * This module defines the application state structure shared by every
 * handler, plus the `FromRef` implementations for Axum state extraction.
 *
 * # Thread Safety
 *
 * All fields are cheap to clone and thread-safe:
 * - `Arc<dyn Store>` for the credential/account store
 * - Cloneable service handles (`TokenService`, `FederationBroker`,
 *   `CompletionFlow`, `TicketStore`) sharing the same store
 * - `Arc<RoomRegistry>` for gateway room membership
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::completion::CompletionFlow;
use crate::backend::auth::federation::{FederationBroker, TicketStore};
use crate::backend::auth::tokens::{TokenConfig, TokenService};
use crate::backend::realtime::RoomRegistry;
use crate::backend::store::Store;

/// Central application state
#[derive(Clone)]
pub struct AppState {
    /// Account and refresh-token storage
    pub store: Arc<dyn Store>,
    /// Token issuance, verification, rotation
    pub tokens: TokenService,
    /// Federation callback reconciliation
    pub federation: FederationBroker,
    /// Registration completion flow
    pub completion: CompletionFlow,
    /// Pending federation tickets
    pub tickets: TicketStore,
    /// Realtime room membership registry
    pub rooms: Arc<RoomRegistry>,
}

impl AppState {
    /// Wire up the full service graph over a store
    pub fn new(store: Arc<dyn Store>, token_config: TokenConfig) -> Self {
        let tokens = TokenService::new(store.clone(), token_config);
        let tickets = TicketStore::new();
        let federation = FederationBroker::new(store.clone(), tickets.clone());
        let completion = CompletionFlow::new(store.clone(), tokens.clone(), tickets.clone());

        Self {
            store,
            tokens,
            federation,
            completion,
            tickets,
            rooms: Arc::new(RoomRegistry::new()),
        }
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for TicketStore {
    fn from_ref(state: &AppState) -> Self {
        state.tickets.clone()
    }
}

impl FromRef<AppState> for Arc<RoomRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.rooms.clone()
    }
}
