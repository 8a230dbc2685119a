/**
 * Persistence Collaborator Contract
 *
 * This module specifies the storage contract the identity subsystem depends
 * on. Persistence engine design is out of scope; any durable store that
 * satisfies this trait suffices. Two implementations ship with the crate:
 *
 * - `PostgresStore` - sqlx-backed production store
 * - `MemoryStore`   - in-process store used in tests and when
 *                     `DATABASE_URL` is not configured
 *
 * # Atomicity
 *
 * `consume_and_replace` is the single-writer serialization point for
 * rotation: consuming the old token and storing its replacement must be one
 * atomic step, so that two concurrent rotation attempts on the same token
 * yield exactly one success and a concurrent family revocation can never
 * run between the consume and the insert.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::auth::accounts::Account;
use crate::backend::error::AuthError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Refresh token record kept server-side for revocation
///
/// The refresh token handed to the client is opaque: the record id in
/// string form. `family_id` groups the lineage of tokens produced by
/// successive rotations of one original issuance; the family is revoked
/// as a unit when reuse is detected.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    /// Record id; doubles as the opaque client-side token
    pub id: Uuid,
    /// Owning account
    pub account_id: Uuid,
    /// Rotation family this token belongs to
    pub family_id: Uuid,
    /// Expiry of this token
    pub expires_at: DateTime<Utc>,
    /// Whether this token has been rotated or revoked
    pub consumed: bool,
    /// Issued at timestamp
    pub created_at: DateTime<Utc>,
}

/// Storage contract for accounts and refresh tokens
///
/// All failures surface as `AuthError::Unavailable`; absence is expressed
/// through `Option`, never through errors.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up an account by email (case-insensitive)
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    /// Look up an account by a linked provider identity
    async fn find_account_by_provider(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Account>, AuthError>;

    /// Look up an account by id
    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError>;

    /// Persist a new account. Fails with `Conflict` if the email is taken.
    async fn create_account(&self, account: Account) -> Result<Account, AuthError>;

    /// Persist changes to an existing account (role, profiles, links)
    async fn update_account(&self, account: Account) -> Result<Account, AuthError>;

    /// Record a newly issued refresh token
    async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Fetch a refresh token record by id
    async fn find_refresh_token(
        &self,
        id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Atomically mark a refresh token consumed
    ///
    /// Returns `true` iff this call transitioned the token from unconsumed
    /// to consumed. Under concurrent calls on the same token, exactly one
    /// caller observes `true`.
    async fn consume_refresh_token(&self, id: Uuid) -> Result<bool, AuthError>;

    /// Atomically consume a refresh token and store its replacement
    ///
    /// The check-and-set on the old token and the insert of `replacement`
    /// are one atomic step: an observer that sees the old token consumed
    /// also sees the replacement. Returns `true` iff this call won the
    /// transition; on `false` the replacement is not stored.
    async fn consume_and_replace(
        &self,
        old_id: Uuid,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, AuthError>;

    /// Mark every token in a rotation family consumed
    ///
    /// Returns the number of tokens newly invalidated.
    async fn invalidate_family(&self, family_id: Uuid) -> Result<u64, AuthError>;
}
