/**
 * Token Service
 *
 * This module issues, verifies, and rotates access/refresh token pairs.
 *
 * # Token Model
 *
 * - Access token: short-lived JWT (HS256) carrying the account id and role.
 *   Verification is stateless: signature plus expiry, nothing else.
 * - Refresh token: opaque id resolved against a server-side record so it
 *   can be revoked. Single-use per rotation cycle.
 *
 * # Replay Defense
 *
 * Every refresh token belongs to a rotation family. Rotating a token
 * consumes it atomically and mints a replacement in the same family.
 * Presenting an already-consumed token is reuse: the entire family is
 * revoked and the user must fully re-authenticate.
 */

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::auth::accounts::Role;
use crate::backend::error::AuthError;
use crate::backend::store::{RefreshTokenRecord, Store};

/// Default access token lifetime: one hour
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;
/// Default refresh token lifetime: seven days
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signing and lifetime configuration for the token service
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret for access tokens
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }

    /// Load token configuration from environment variables
    ///
    /// Reads `JWT_SECRET`, `ACCESS_TOKEN_TTL_SECS`, `REFRESH_TOKEN_TTL_SECS`.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|err| {
            tracing::warn!("Missing JWT_SECRET ({}), using development default", err);
            "dev-secret-change-in-production".to_string()
        });

        let access_ttl_secs = std::env::var("ACCESS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ACCESS_TTL_SECS);
        let refresh_ttl_secs = std::env::var("REFRESH_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_TTL_SECS);

        Self { secret, access_ttl_secs, refresh_ttl_secs }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id (standard JWT `sub` claim)
    pub sub: String,
    /// Role at issuance time
    pub role: Role,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiration time (unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// Parse the subject into an account id
    pub fn account_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidCredential)
    }
}

/// An access/refresh token pair returned to the client
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Signed JWT, carried as `Authorization: Bearer <token>`
    pub access_token: String,
    /// Opaque server-resolvable refresh token
    pub refresh_token: String,
}

/// Issues, verifies, rotates, and revokes token pairs
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
    config: TokenConfig,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>, config: TokenConfig) -> Self {
        Self { store, config }
    }

    /// Issue a fresh token pair opening a new rotation family
    ///
    /// # Errors
    ///
    /// * `Unauthorized` - The account has no assigned role yet. An account
    ///   with role `unassigned` is never permitted to hold a live session.
    pub async fn issue(&self, account_id: Uuid, role: Role) -> Result<TokenPair, AuthError> {
        self.issue_in_family(account_id, role, Uuid::new_v4()).await
    }

    /// Verify an access token and return its claims
    ///
    /// Stateless signature + expiry check. Bad signature and malformed
    /// payload are indistinguishable (`InvalidCredential`); only a decoded
    /// token past its window reports `Expired`.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let key = DecodingKey::from_secret(self.config.secret.as_ref());
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<AccessClaims>(token, &key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                Err(AuthError::Expired)
            }
            Err(_) => Err(AuthError::InvalidCredential),
        }
    }

    /// Rotate a refresh token, yielding a new pair in the same family
    ///
    /// Exactly one of two concurrent rotations of the same token succeeds;
    /// the other observes `ReuseDetected` and revokes the family.
    ///
    /// # Errors
    ///
    /// * `ReuseDetected` - The token is unknown or was already consumed.
    ///   Every live token in its family is invalidated before returning.
    /// * `Expired` - The refresh token is past its validity window.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let id = Uuid::parse_str(refresh_token).map_err(|_| AuthError::InvalidCredential)?;

        let record = match self.store.find_refresh_token(id).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Rotation attempted with unknown refresh token");
                return Err(AuthError::ReuseDetected);
            }
        };

        if record.expires_at <= Utc::now() {
            return Err(AuthError::Expired);
        }

        let account = self
            .store
            .find_account_by_id(record.account_id)
            .await?
            .ok_or(AuthError::InvalidCredential)?;
        if account.role == Role::Unassigned {
            tracing::warn!("Refusing to rotate tokens for unassigned account {}", account.id);
            return Err(AuthError::Unauthorized);
        }

        let access_token = self.sign_access(record.account_id, account.role)?;
        let replacement = self.new_refresh_record(record.account_id, record.family_id);
        let refresh_token = replacement.id.to_string();

        // Consume-and-replace is the serialization point, and it is a
        // single store operation: a racing replay that revokes the family
        // either runs before it (this call loses) or after the replacement
        // is already visible (the replacement is swept with the family).
        if !self.store.consume_and_replace(id, replacement).await? {
            let revoked = self.store.invalidate_family(record.family_id).await?;
            tracing::warn!(
                "Refresh token reuse detected for account {}; revoked {} family tokens",
                record.account_id,
                revoked
            );
            return Err(AuthError::ReuseDetected);
        }

        Ok(TokenPair { access_token, refresh_token })
    }

    /// Revoke a refresh token without issuing a replacement (logout)
    ///
    /// Idempotent: revoking an unknown or already-consumed token is a no-op.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let Ok(id) = Uuid::parse_str(refresh_token) else {
            return Ok(());
        };
        self.store.consume_refresh_token(id).await?;
        Ok(())
    }

    async fn issue_in_family(
        &self,
        account_id: Uuid,
        role: Role,
        family_id: Uuid,
    ) -> Result<TokenPair, AuthError> {
        if role == Role::Unassigned {
            tracing::warn!("Refusing to issue tokens for unassigned account {}", account_id);
            return Err(AuthError::Unauthorized);
        }

        let access_token = self.sign_access(account_id, role)?;
        let record = self.new_refresh_record(account_id, family_id);
        let refresh_token = record.id.to_string();
        self.store.store_refresh_token(record).await?;

        Ok(TokenPair { access_token, refresh_token })
    }

    fn sign_access(&self, account_id: Uuid, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: account_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: now.timestamp() + self.config.access_ttl_secs,
        };

        let key = EncodingKey::from_secret(self.config.secret.as_ref());
        encode(&Header::default(), &claims, &key)
            .map_err(|err| AuthError::Unavailable(format!("token signing failed: {err}")))
    }

    fn new_refresh_record(&self, account_id: Uuid, family_id: Uuid) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            account_id,
            family_id,
            expires_at: now + Duration::seconds(self.config.refresh_ttl_secs),
            consumed: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use assert_matches::assert_matches;

    fn service() -> TokenService {
        TokenService::new(Arc::new(MemoryStore::new()), TokenConfig::new("test-secret"))
    }

    #[tokio::test]
    async fn test_issue_then_verify_roundtrip() {
        let tokens = service();
        let account_id = Uuid::new_v4();

        let pair = tokens.issue(account_id, Role::Junior).await.unwrap();
        let claims = tokens.verify_access(&pair.access_token).unwrap();

        assert_eq!(claims.account_id().unwrap(), account_id);
        assert_eq!(claims.role, Role::Junior);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn test_issue_refuses_unassigned_role() {
        let tokens = service();
        let result = tokens.issue(Uuid::new_v4(), Role::Unassigned).await;
        assert_matches!(result, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_and_tampering() {
        let tokens = service();
        let pair = tokens.issue(Uuid::new_v4(), Role::Company).await.unwrap();

        assert_matches!(
            tokens.verify_access("not.a.token"),
            Err(AuthError::InvalidCredential)
        );

        // Same token signed under a different secret
        let other = TokenService::new(
            Arc::new(MemoryStore::new()),
            TokenConfig::new("other-secret"),
        );
        assert_matches!(
            other.verify_access(&pair.access_token),
            Err(AuthError::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn test_verify_expired_token() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut config = TokenConfig::new("test-secret");
        config.access_ttl_secs = -10;
        let tokens = TokenService::new(store, config);

        let pair = tokens.issue(Uuid::new_v4(), Role::Junior).await.unwrap();
        assert_matches!(tokens.verify_access(&pair.access_token), Err(AuthError::Expired));
    }

    async fn seeded_service() -> (TokenService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let account =
            crate::backend::auth::accounts::Account::new("dev@example.com", None, Role::Junior);
        let account_id = account.id;
        store.create_account(account).await.unwrap();
        let tokens = TokenService::new(store, TokenConfig::new("test-secret"));
        (tokens, account_id)
    }

    #[tokio::test]
    async fn test_rotate_consumes_old_token() {
        let (tokens, account_id) = seeded_service().await;
        let first = tokens.issue(account_id, Role::Junior).await.unwrap();

        let second = tokens.rotate(&first.refresh_token).await.unwrap();
        let claims = tokens.verify_access(&second.access_token).unwrap();
        assert_eq!(claims.account_id().unwrap(), account_id);

        // The rotated-away token is now a replay
        assert_matches!(
            tokens.rotate(&first.refresh_token).await,
            Err(AuthError::ReuseDetected)
        );
    }

    #[tokio::test]
    async fn test_reuse_revokes_whole_family() {
        let (tokens, account_id) = seeded_service().await;
        let first = tokens.issue(account_id, Role::Junior).await.unwrap();
        let second = tokens.rotate(&first.refresh_token).await.unwrap();

        // Replay of the first token kills the family
        assert_matches!(
            tokens.rotate(&first.refresh_token).await,
            Err(AuthError::ReuseDetected)
        );

        // The legitimate successor can no longer rotate either
        assert_matches!(
            tokens.rotate(&second.refresh_token).await,
            Err(AuthError::ReuseDetected)
        );
    }

    #[tokio::test]
    async fn test_concurrent_rotation_single_winner() {
        let (tokens, account_id) = seeded_service().await;
        let pair = tokens.issue(account_id, Role::Junior).await.unwrap();

        let (a, b) = tokio::join!(
            tokens.rotate(&pair.refresh_token),
            tokens.rotate(&pair.refresh_token)
        );
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        for result in [a, b] {
            if let Err(err) = result {
                assert_matches!(err, AuthError::ReuseDetected);
            }
        }
    }

    /// Store wrapper that fires a family revocation the instant a
    /// rotation's consume-and-replace lands, the worst-case interleaving
    /// for a replayed token racing the legitimate rotation.
    struct RevokeOnReplaceStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl Store for RevokeOnReplaceStore {
        async fn find_account_by_email(
            &self,
            email: &str,
        ) -> Result<Option<crate::backend::auth::accounts::Account>, AuthError> {
            self.inner.find_account_by_email(email).await
        }

        async fn find_account_by_provider(
            &self,
            provider: &str,
            subject: &str,
        ) -> Result<Option<crate::backend::auth::accounts::Account>, AuthError> {
            self.inner.find_account_by_provider(provider, subject).await
        }

        async fn find_account_by_id(
            &self,
            id: Uuid,
        ) -> Result<Option<crate::backend::auth::accounts::Account>, AuthError> {
            self.inner.find_account_by_id(id).await
        }

        async fn create_account(
            &self,
            account: crate::backend::auth::accounts::Account,
        ) -> Result<crate::backend::auth::accounts::Account, AuthError> {
            self.inner.create_account(account).await
        }

        async fn update_account(
            &self,
            account: crate::backend::auth::accounts::Account,
        ) -> Result<crate::backend::auth::accounts::Account, AuthError> {
            self.inner.update_account(account).await
        }

        async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
            self.inner.store_refresh_token(record).await
        }

        async fn find_refresh_token(
            &self,
            id: Uuid,
        ) -> Result<Option<RefreshTokenRecord>, AuthError> {
            self.inner.find_refresh_token(id).await
        }

        async fn consume_refresh_token(&self, id: Uuid) -> Result<bool, AuthError> {
            self.inner.consume_refresh_token(id).await
        }

        async fn consume_and_replace(
            &self,
            old_id: Uuid,
            replacement: RefreshTokenRecord,
        ) -> Result<bool, AuthError> {
            let family_id = replacement.family_id;
            let won = self.inner.consume_and_replace(old_id, replacement).await?;
            if won {
                // The replay's revocation arrives immediately after the
                // swap; atomicity means it must see the replacement.
                self.inner.invalidate_family(family_id).await?;
            }
            Ok(won)
        }

        async fn invalidate_family(&self, family_id: Uuid) -> Result<u64, AuthError> {
            self.inner.invalidate_family(family_id).await
        }
    }

    #[tokio::test]
    async fn test_replacement_never_survives_family_revocation() {
        let inner = MemoryStore::new();
        let account =
            crate::backend::auth::accounts::Account::new("dev@example.com", None, Role::Junior);
        let account_id = account.id;
        inner.create_account(account).await.unwrap();

        let store = Arc::new(RevokeOnReplaceStore { inner });
        let tokens = TokenService::new(store, TokenConfig::new("test-secret"));

        let first = tokens.issue(account_id, Role::Junior).await.unwrap();
        let second = tokens.rotate(&first.refresh_token).await.unwrap();

        // The revocation racing the rotation swept the freshly stored
        // replacement: no live token survives in the family.
        assert_matches!(
            tokens.rotate(&second.refresh_token).await,
            Err(AuthError::ReuseDetected)
        );
    }

    #[tokio::test]
    async fn test_unknown_refresh_token_is_reuse() {
        let (tokens, _) = seeded_service().await;
        assert_matches!(
            tokens.rotate(&Uuid::new_v4().to_string()).await,
            Err(AuthError::ReuseDetected)
        );
        assert_matches!(tokens.rotate("garbage").await, Err(AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_revoke_then_rotate_is_reuse() {
        let (tokens, account_id) = seeded_service().await;
        let pair = tokens.issue(account_id, Role::Junior).await.unwrap();

        tokens.revoke(&pair.refresh_token).await.unwrap();
        assert_matches!(
            tokens.rotate(&pair.refresh_token).await,
            Err(AuthError::ReuseDetected)
        );

        // Revocation is idempotent
        tokens.revoke(&pair.refresh_token).await.unwrap();
        tokens.revoke("garbage").await.unwrap();
    }
}
