/**
 * In-Memory Store
 *
 * This module implements the storage contract on plain in-process maps.
 * It backs the server when `DATABASE_URL` is not configured and is the
 * default store in tests.
 *
 * # Concurrency
 *
 * All state lives behind a single `Mutex`, which makes the consume
 * check-and-set trivially atomic: the flag is read and written under one
 * lock acquisition.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::backend::auth::accounts::Account;
use crate::backend::error::AuthError;
use crate::backend::store::{RefreshTokenRecord, Store};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    refresh_tokens: HashMap<Uuid, RefreshTokenRecord>,
}

/// In-process implementation of the storage contract
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, AuthError> {
        self.state
            .lock()
            .map_err(|_| AuthError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let needle = email.to_lowercase();
        let state = self.lock()?;
        Ok(state
            .accounts
            .values()
            .find(|account| account.email == needle)
            .cloned())
    }

    async fn find_account_by_provider(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Account>, AuthError> {
        let state = self.lock()?;
        Ok(state
            .accounts
            .values()
            .find(|account| account.has_provider(provider, subject))
            .cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        let state = self.lock()?;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn create_account(&self, account: Account) -> Result<Account, AuthError> {
        let mut state = self.lock()?;
        if state
            .accounts
            .values()
            .any(|existing| existing.email == account.email)
        {
            return Err(AuthError::Conflict("email already registered".to_string()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(&self, account: Account) -> Result<Account, AuthError> {
        let mut state = self.lock()?;
        if !state.accounts.contains_key(&account.id) {
            return Err(AuthError::Unavailable("account not found".to_string()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        state.refresh_tokens.insert(record.id, record);
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let state = self.lock()?;
        Ok(state.refresh_tokens.get(&id).cloned())
    }

    async fn consume_refresh_token(&self, id: Uuid) -> Result<bool, AuthError> {
        let mut state = self.lock()?;
        match state.refresh_tokens.get_mut(&id) {
            Some(record) if !record.consumed => {
                record.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn consume_and_replace(
        &self,
        old_id: Uuid,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, AuthError> {
        let mut state = self.lock()?;
        let won = match state.refresh_tokens.get_mut(&old_id) {
            Some(record) if !record.consumed => {
                record.consumed = true;
                true
            }
            _ => false,
        };
        if won {
            state.refresh_tokens.insert(replacement.id, replacement);
        }
        Ok(won)
    }

    async fn invalidate_family(&self, family_id: Uuid) -> Result<u64, AuthError> {
        let mut state = self.lock()?;
        let mut invalidated = 0;
        for record in state.refresh_tokens.values_mut() {
            if record.family_id == family_id && !record.consumed {
                record.consumed = true;
                invalidated += 1;
            }
        }
        Ok(invalidated)
    }
}
