use serde::Serialize;
use sqlx::FromRow;

use crate::account::password::PasswordDigest;

/// Account row in the `user` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: PasswordDigest, // never exposed in JSON
}

/// Insert payload, produced by `hooks::before_create` after validation.
///
/// Fields are readable but only this crate can build one, so every insert
/// carries a validated, hashed record:
///
/// ```compile_fail
/// use account_store::account::repo_types::NewAccountRecord;
///
/// let record = NewAccountRecord {
///     username: String::new(),
///     email: "NOT AN EMAIL".to_string(),
///     password: todo!(),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct NewAccountRecord {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: PasswordDigest,
}

impl NewAccountRecord {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &PasswordDigest {
        &self.password
    }
}

/// Update payload, produced by `hooks::before_update` after validation.
/// `None` keeps the stored column value.
///
/// ```compile_fail
/// use account_store::account::repo_types::AccountChangeSet;
///
/// let changes = AccountChangeSet {
///     email: Some("NOT AN EMAIL".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccountChangeSet {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<PasswordDigest>,
}

impl AccountChangeSet {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn password(&self) -> Option<&PasswordDigest> {
        self.password.as_ref()
    }
}
