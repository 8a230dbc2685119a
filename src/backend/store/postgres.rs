/**
 * PostgreSQL Store
 *
 * This module implements the storage contract on a sqlx PostgreSQL pool.
 *
 * # Atomicity
 *
 * The rotation check-and-set is a conditional UPDATE
 * (`... WHERE id = $1 AND NOT consumed`): the row count tells whether this
 * call won the transition. `consume_and_replace` runs that UPDATE and the
 * insert of the replacement in one transaction, so a concurrent family
 * revocation blocks on the old token's row lock and, once it proceeds,
 * sees the committed replacement.
 *
 * # Schema
 *
 * See `migrations/`. Accounts are stored flat with nullable role-profile
 * columns; provider links live in their own table keyed by
 * `(provider, subject)`.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::backend::auth::accounts::{
    Account, CompanyProfile, JuniorProfile, ProviderLink, Role,
};
use crate::backend::error::AuthError;
use crate::backend::store::{RefreshTokenRecord, Store};

/// sqlx-backed implementation of the storage contract
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row shape of the `accounts` table
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    role: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    experience_level: Option<String>,
    skills: Option<Vec<String>>,
    portfolio_url: Option<String>,
    company_name: Option<String>,
    industry: Option<String>,
    website: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProviderLinkRow {
    provider: String,
    subject: String,
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    account_id: Uuid,
    family_id: Uuid,
    expires_at: DateTime<Utc>,
    consumed: bool,
    created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            family_id: row.family_id,
            expires_at: row.expires_at,
            consumed: row.consumed,
            created_at: row.created_at,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, role, display_name, avatar_url, \
     experience_level, skills, portfolio_url, company_name, industry, website, \
     created_at, updated_at";

impl AccountRow {
    fn into_account(self, links: Vec<ProviderLink>) -> Result<Account, AuthError> {
        let role = Role::from_str(&self.role)
            .map_err(|_| AuthError::Unavailable(format!("unknown stored role `{}`", self.role)))?;

        let junior_profile = match (self.experience_level, self.skills) {
            (Some(experience_level), Some(skills)) => Some(JuniorProfile {
                experience_level,
                skills,
                portfolio_url: self.portfolio_url,
            }),
            _ => None,
        };
        let company_profile = match (self.company_name, self.industry) {
            (Some(company_name), Some(industry)) => Some(CompanyProfile {
                company_name,
                industry,
                website: self.website,
            }),
            _ => None,
        };

        Ok(Account {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            role,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            provider_links: links,
            junior_profile,
            company_profile,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PostgresStore {
    async fn load_links(&self, account_id: Uuid) -> Result<Vec<ProviderLink>, AuthError> {
        let rows = sqlx::query_as::<_, ProviderLinkRow>(
            "SELECT provider, subject FROM provider_links WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProviderLink { provider: row.provider, subject: row.subject })
            .collect())
    }

    async fn hydrate(&self, row: Option<AccountRow>) -> Result<Option<Account>, AuthError> {
        match row {
            Some(row) => {
                let links = self.load_links(row.id).await?;
                Ok(Some(row.into_account(links)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_account_by_provider(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts a \
             JOIN provider_links l ON l.account_id = a.id \
             WHERE l.provider = $1 AND l.subject = $2"
        ))
        .bind(provider)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn create_account(&self, account: Account) -> Result<Account, AuthError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO accounts \
             (id, email, password_hash, role, display_name, avatar_url, \
              experience_level, skills, portfolio_url, company_name, industry, website, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.display_name)
        .bind(&account.avatar_url)
        .bind(account.junior_profile.as_ref().map(|p| p.experience_level.clone()))
        .bind(account.junior_profile.as_ref().map(|p| p.skills.clone()))
        .bind(account.junior_profile.as_ref().and_then(|p| p.portfolio_url.clone()))
        .bind(account.company_profile.as_ref().map(|p| p.company_name.clone()))
        .bind(account.company_profile.as_ref().map(|p| p.industry.clone()))
        .bind(account.company_profile.as_ref().and_then(|p| p.website.clone()))
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = result {
            if err
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false)
            {
                return Err(AuthError::Conflict("email already registered".to_string()));
            }
            return Err(err.into());
        }

        for link in &account.provider_links {
            sqlx::query(
                "INSERT INTO provider_links (account_id, provider, subject) VALUES ($1, $2, $3)",
            )
            .bind(account.id)
            .bind(&link.provider)
            .bind(&link.subject)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(account)
    }

    async fn update_account(&self, account: Account) -> Result<Account, AuthError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE accounts SET \
             email = $2, password_hash = $3, role = $4, display_name = $5, avatar_url = $6, \
             experience_level = $7, skills = $8, portfolio_url = $9, \
             company_name = $10, industry = $11, website = $12, updated_at = $13 \
             WHERE id = $1",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.display_name)
        .bind(&account.avatar_url)
        .bind(account.junior_profile.as_ref().map(|p| p.experience_level.clone()))
        .bind(account.junior_profile.as_ref().map(|p| p.skills.clone()))
        .bind(account.junior_profile.as_ref().and_then(|p| p.portfolio_url.clone()))
        .bind(account.company_profile.as_ref().map(|p| p.company_name.clone()))
        .bind(account.company_profile.as_ref().map(|p| p.industry.clone()))
        .bind(account.company_profile.as_ref().and_then(|p| p.website.clone()))
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await?;

        // Re-write provider links; an account carries few of them
        sqlx::query("DELETE FROM provider_links WHERE account_id = $1")
            .bind(account.id)
            .execute(&mut *tx)
            .await?;
        for link in &account.provider_links {
            sqlx::query(
                "INSERT INTO provider_links (account_id, provider, subject) VALUES ($1, $2, $3)",
            )
            .bind(account.id)
            .bind(&link.provider)
            .bind(&link.subject)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(account)
    }

    async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, account_id, family_id, expires_at, consumed, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.account_id)
        .bind(record.family_id)
        .bind(record.expires_at)
        .bind(record.consumed)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_refresh_token(
        &self,
        id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT id, account_id, family_id, expires_at, consumed, created_at \
             FROM refresh_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshTokenRecord::from))
    }

    async fn consume_refresh_token(&self, id: Uuid) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET consumed = TRUE WHERE id = $1 AND NOT consumed",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn consume_and_replace(
        &self,
        old_id: Uuid,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, AuthError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE refresh_tokens SET consumed = TRUE WHERE id = $1 AND NOT consumed",
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() != 1 {
            // Dropping the transaction rolls back
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO refresh_tokens (id, account_id, family_id, expires_at, consumed, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(replacement.id)
        .bind(replacement.account_id)
        .bind(replacement.family_id)
        .bind(replacement.expires_at)
        .bind(replacement.consumed)
        .bind(replacement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn invalidate_family(&self, family_id: Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET consumed = TRUE WHERE family_id = $1 AND NOT consumed",
        )
        .bind(family_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
