use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AccountResult;
use crate::models::{LinkedAccount, UpsertLinkedAccount};

/// Storage for linked accounts, keyed uniquely by `remote_account_id`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkedAccountRepository: Send + Sync {
    /// Insert, or refresh the existing row with the same `remote_account_id`.
    async fn upsert(&self, input: UpsertLinkedAccount) -> AccountResult<LinkedAccount>;

    /// Accounts owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> AccountResult<Vec<LinkedAccount>>;

    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<LinkedAccount>>;

    async fn delete(&self, id: Uuid) -> AccountResult<bool>;
}

/// In-memory implementation of LinkedAccountRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryLinkedAccountRepository {
    accounts: Arc<RwLock<HashMap<String, LinkedAccount>>>,
}

impl InMemoryLinkedAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    pub async fn find_by_remote_id(&self, remote_account_id: &str) -> Option<LinkedAccount> {
        self.accounts.read().await.get(remote_account_id).cloned()
    }
}

#[async_trait]
impl LinkedAccountRepository for InMemoryLinkedAccountRepository {
    async fn upsert(&self, input: UpsertLinkedAccount) -> AccountResult<LinkedAccount> {
        let mut accounts = self.accounts.write().await;

        let account = match accounts.get_mut(&input.remote_account_id) {
            Some(existing) => {
                existing.refresh(input);
                existing.clone()
            }
            None => {
                let account = input.into_new_account();
                accounts.insert(account.remote_account_id.clone(), account.clone());
                account
            }
        };

        tracing::info!(
            account_id = %account.id,
            remote_account_id = %account.remote_account_id,
            "Upserted linked account"
        );
        Ok(account)
    }

    async fn list_by_user(&self, user_id: Uuid) -> AccountResult<Vec<LinkedAccount>> {
        let accounts = self.accounts.read().await;

        let mut result: Vec<LinkedAccount> = accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result)
    }

    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<LinkedAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> AccountResult<bool> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|_, a| a.id != id);

        let deleted = accounts.len() < before;
        if deleted {
            tracing::info!(account_id = %id, "Deleted linked account");
        }
        Ok(deleted)
    }
}
