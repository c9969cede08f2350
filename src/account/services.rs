use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::account::dto::{AccountChanges, NewAccount};
use crate::account::hooks::{before_create, before_update};
use crate::account::password::Hasher;
use crate::account::repo::AccountRepository;
use crate::account::repo_types::Account;
use crate::account::validation::{normalize_email, validate_changes, validate_new};
use crate::error::{AccountError, AccountResult, FieldViolation};

/// Every write to accounts goes through here: validate, hash, write.
#[derive(Clone)]
pub struct AccountStore {
    repo: Arc<dyn AccountRepository>,
    hasher: Hasher,
}

impl AccountStore {
    pub fn new(repo: Arc<dyn AccountRepository>, hasher: Hasher) -> Self {
        Self { repo, hasher }
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, mut account: NewAccount) -> AccountResult<Account> {
        account.email = normalize_email(&account.email);
        validate_new(&account)?;

        if self.repo.find_by_email(&account.email).await?.is_some() {
            warn!(email = %account.email, "email already registered");
            return Err(AccountError::DuplicateEmail(account.email));
        }

        let record = before_create(&self.hasher, account).await?;
        let created = self.repo.insert(record).await?;

        info!(account_id = created.id, email = %created.email, "account registered");
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> AccountResult<Account> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    pub async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        self.repo.find_by_email(&normalize_email(email)).await
    }

    /// Both bounds must be non-negative; the table rejects anything else.
    pub async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>> {
        let mut violations = Vec::new();
        if limit < 0 {
            violations.push(FieldViolation::new("limit", "must not be negative"));
        }
        if offset < 0 {
            violations.push(FieldViolation::new("offset", "must not be negative"));
        }
        if !violations.is_empty() {
            warn!(limit, offset, "account listing rejected");
            return Err(AccountError::Validation(violations));
        }
        self.repo.list(limit, offset).await
    }

    pub async fn count(&self) -> AccountResult<i64> {
        self.repo.count().await
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i32, mut changes: AccountChanges) -> AccountResult<Account> {
        if let Some(email) = changes.email.as_mut() {
            *email = normalize_email(email);
        }
        validate_changes(&changes)?;

        if changes.is_empty() {
            return self.get(id).await;
        }

        if let Some(email) = &changes.email {
            if let Some(holder) = self.repo.find_by_email(email).await? {
                if holder.id != id {
                    warn!(account_id = id, email = %email, "email held by another account");
                    return Err(AccountError::DuplicateEmail(email.clone()));
                }
            }
        }

        let password_changed = changes.password.is_some();
        let change_set = before_update(&self.hasher, changes).await?;
        let updated = self.repo.update(id, change_set).await?;

        info!(account_id = id, password_changed, "account updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AccountResult<()> {
        if !self.repo.delete(id).await? {
            return Err(AccountError::NotFound(id));
        }
        info!(account_id = id, "account deleted");
        Ok(())
    }

    /// Checks `plain` against the stored digest of account `id`.
    #[instrument(skip(self, plain))]
    pub async fn check_password(&self, id: i32, plain: &str) -> AccountResult<bool> {
        let account = self.get(id).await?;
        self.hasher.verify(plain, &account.password)
    }
}
