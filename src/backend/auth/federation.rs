/**
 * Identity Federation Broker
 *
 * This module reconciles externally verified federation profiles against
 * local accounts. The provider protocol handshake itself happens upstream;
 * the broker only consumes its verified output.
 *
 * # Outcomes
 *
 * A callback resolves to a tagged union:
 * - `Matched(Account)`   - an account exists (by provider link or by email);
 *                          any missing provider link is added idempotently,
 *                          and the caller proceeds straight to token issuance.
 * - `Unmatched(ticket)`  - no account exists; a pending ticket is minted and
 *                          the caller must run the completion flow. No
 *                          account or token is created yet.
 *
 * An email collision with an account linked to a *different* provider is
 * treated as `Matched`: accounts are keyed by verified email, not by
 * provider identity, so the new provider is silently linked.
 *
 * # Pending Tickets
 *
 * Tickets are ephemeral: held in process memory with a short TTL and
 * consumed exactly once. Nothing is persisted between the callback and the
 * completion submission.
 */

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::backend::auth::accounts::Account;
use crate::backend::error::AuthError;
use crate::backend::store::Store;

/// How long a pending ticket stays redeemable
const TICKET_TTL_MINUTES: i64 = 15;

/// Externally verified federation profile
///
/// Produced by the collaborator that completed the provider handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederatedProfile {
    /// Provider name (e.g. "github", "google")
    pub provider: String,
    /// Provider-scoped subject id
    pub subject: String,
    /// Verified email address
    pub email: String,
    /// Display name from the provider
    pub display_name: String,
    /// Optional avatar URL
    pub avatar_url: Option<String>,
}

/// Transient record of a federation profile awaiting local role assignment
#[derive(Debug, Clone)]
pub struct PendingTicket {
    /// Ticket id returned to the client
    pub id: Uuid,
    /// Profile captured at callback time
    pub profile: FederatedProfile,
    /// Minting time; the ticket expires `TICKET_TTL_MINUTES` later
    pub issued_at: DateTime<Utc>,
}

/// Result of reconciling a federation callback
#[derive(Debug, Clone)]
pub enum FederationOutcome {
    /// An account exists; proceed to token issuance
    Matched(Account),
    /// No account exists; the completion flow must consume this ticket
    Unmatched(PendingTicket),
}

/// In-memory store of pending federation tickets
///
/// Each ticket is consumed exactly once; expired tickets are swept
/// periodically and also rejected at consumption time. Like the room
/// registry, the map sits behind a plain mutex and lock poisoning panics;
/// a ticket id is never handed out without the ticket being stored.
#[derive(Clone, Default)]
pub struct TicketStore {
    tickets: Arc<Mutex<HashMap<Uuid, PendingTicket>>>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a ticket for an unmatched profile
    ///
    /// The returned ticket is always stored; the caller may hand its id to
    /// the client unconditionally.
    pub fn mint(&self, profile: FederatedProfile) -> PendingTicket {
        let ticket = PendingTicket {
            id: Uuid::new_v4(),
            profile,
            issued_at: Utc::now(),
        };
        self.tickets.lock().unwrap().insert(ticket.id, ticket.clone());
        ticket
    }

    /// Consume a ticket. Returns `None` if it is unknown, already
    /// consumed, or expired.
    pub fn consume(&self, id: Uuid) -> Option<PendingTicket> {
        let ticket = self.tickets.lock().unwrap().remove(&id)?;
        if Utc::now() - ticket.issued_at > Duration::minutes(TICKET_TTL_MINUTES) {
            return None;
        }
        Some(ticket)
    }

    /// Peek at a ticket without consuming it
    pub fn peek(&self, id: Uuid) -> Option<PendingTicket> {
        let tickets = self.tickets.lock().unwrap();
        let ticket = tickets.get(&id)?;
        if Utc::now() - ticket.issued_at > Duration::minutes(TICKET_TTL_MINUTES) {
            return None;
        }
        Some(ticket.clone())
    }

    /// Drop tickets past their TTL
    pub fn sweep_expired(&self) {
        let cutoff = Utc::now() - Duration::minutes(TICKET_TTL_MINUTES);
        self.tickets
            .lock()
            .unwrap()
            .retain(|_, ticket| ticket.issued_at > cutoff);
    }
}

/// Reconciles federation callbacks against local accounts
#[derive(Clone)]
pub struct FederationBroker {
    store: Arc<dyn Store>,
    tickets: TicketStore,
}

impl FederationBroker {
    pub fn new(store: Arc<dyn Store>, tickets: TicketStore) -> Self {
        Self { store, tickets }
    }

    /// Handle a provider callback carrying a verified profile
    ///
    /// Lookup order: linked provider identity first, then email
    /// (case-insensitive). On an email match the provider link is added
    /// idempotently before returning `Matched`.
    pub async fn handle_callback(
        &self,
        profile: FederatedProfile,
    ) -> Result<FederationOutcome, AuthError> {
        if let Some(account) = self
            .store
            .find_account_by_provider(&profile.provider, &profile.subject)
            .await?
        {
            tracing::info!(
                "Federation callback matched account {} by {} link",
                account.id,
                profile.provider
            );
            return Ok(FederationOutcome::Matched(account));
        }

        if let Some(mut account) = self.store.find_account_by_email(&profile.email).await? {
            // Email match with a different (or no) provider link: accounts
            // are keyed by verified email, so link and proceed.
            if !account.has_provider(&profile.provider, &profile.subject) {
                account.link_provider(profile.provider.clone(), profile.subject.clone());
                account = self.store.update_account(account).await?;
                tracing::info!(
                    "Linked {} identity to existing account {}",
                    profile.provider,
                    account.id
                );
            }
            return Ok(FederationOutcome::Matched(account));
        }

        let ticket = self.tickets.mint(profile);
        tracing::info!("Federation callback unmatched; minted pending ticket {}", ticket.id);
        Ok(FederationOutcome::Unmatched(ticket))
    }
}
