use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::account::repo::AccountRepository;
use crate::account::repo_types::{Account, AccountChangeSet, NewAccountRecord};
use crate::error::{AccountError, AccountResult};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i32, Account>,
    last_id: i32,
}

impl Table {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|a| Some(a.id) != except && a.email == email)
    }
}

/// In-memory stand-in for the `user` table (tests, local development).
/// Mirrors the table's serial id and unique email constraint.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, record: NewAccountRecord) -> AccountResult<Account> {
        let mut table = self.table.write().await;
        if table.email_taken(&record.email, None) {
            return Err(AccountError::DuplicateEmail(record.email));
        }

        table.last_id += 1;
        let account = Account {
            id: table.last_id,
            username: record.username,
            email: record.email,
            password: record.password,
        };
        table.rows.insert(account.id, account.clone());

        tracing::info!(account_id = account.id, "account row inserted");
        Ok(account)
    }

    async fn find_by_id(&self, id: i32) -> AccountResult<Option<Account>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|a| a.email == email).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i32, changes: AccountChangeSet) -> AccountResult<Account> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&id) {
            return Err(AccountError::NotFound(id));
        }
        if let Some(email) = &changes.email {
            if table.email_taken(email, Some(id)) {
                return Err(AccountError::DuplicateEmail(email.clone()));
            }
        }

        let account = table.rows.get_mut(&id).ok_or(AccountError::NotFound(id))?;
        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(password) = changes.password {
            account.password = password;
        }

        tracing::info!(account_id = id, "account row updated");
        Ok(account.clone())
    }

    async fn delete(&self, id: i32) -> AccountResult<bool> {
        let removed = self.table.write().await.rows.remove(&id).is_some();
        if removed {
            tracing::info!(account_id = id, "account row deleted");
        }
        Ok(removed)
    }

    async fn count(&self) -> AccountResult<i64> {
        Ok(self.table.read().await.rows.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::password::cheap_hasher;

    fn record(email: &str) -> NewAccountRecord {
        NewAccountRecord {
            username: "ann".into(),
            email: email.into(),
            password: cheap_hasher().hash_blocking("pass").unwrap(),
        }
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_never_reused() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.insert(record("a@example.com")).await.unwrap();
        let b = repo.insert(record("b@example.com")).await.unwrap();
        assert!(repo.delete(b.id).await.unwrap());
        let c = repo.insert(record("c@example.com")).await.unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(record("a@example.com")).await.unwrap();
        let err = repo.insert(record("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::DuplicateEmail(e) if e == "a@example.com"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.insert(record("a@example.com")).await.unwrap();
        let changes = AccountChangeSet {
            username: Some("bob".into()),
            ..Default::default()
        };
        let updated = repo.update(a.id, changes).await.unwrap();
        assert_eq!(updated.username, "bob");
        assert_eq!(updated.email, a.email);
        assert_eq!(updated.password, a.password);
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_account() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(record("a@example.com")).await.unwrap();
        let b = repo.insert(record("b@example.com")).await.unwrap();
        let changes = AccountChangeSet {
            email: Some("a@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(b.id, changes).await,
            Err(AccountError::DuplicateEmail(_))
        ));
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let repo = InMemoryAccountRepository::new();
        let err = repo.update(42, AccountChangeSet::default()).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(42)));
    }

    #[tokio::test]
    async fn list_pages_in_id_order() {
        let repo = InMemoryAccountRepository::new();
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            repo.insert(record(email)).await.unwrap();
        }
        let page: Vec<i32> = repo
            .list(2, 1)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(page, vec![2, 3]);
    }
}
