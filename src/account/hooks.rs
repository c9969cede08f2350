//! Pre-save transforms run on every write to the `user` table.
//!
//! Both hooks take a validated candidate and swap its plaintext password for
//! a digest. The repository only accepts the records they return.

use tracing::debug;

use crate::account::dto::{AccountChanges, NewAccount};
use crate::account::password::Hasher;
use crate::account::repo_types::{AccountChangeSet, NewAccountRecord};
use crate::error::AccountResult;

pub async fn before_create(
    hasher: &Hasher,
    account: NewAccount,
) -> AccountResult<NewAccountRecord> {
    let NewAccount {
        username,
        email,
        password,
    } = account;
    let password = hasher.hash(password).await?;
    debug!(email = %email, "password hashed before insert");
    Ok(NewAccountRecord {
        username,
        email,
        password,
    })
}

/// Leaves the stored digest alone when the patch carries no password.
pub async fn before_update(
    hasher: &Hasher,
    changes: AccountChanges,
) -> AccountResult<AccountChangeSet> {
    let AccountChanges {
        username,
        email,
        password,
    } = changes;
    let password = match password {
        Some(plain) => {
            let digest = hasher.hash(plain).await?;
            debug!("password re-hashed before update");
            Some(digest)
        }
        None => None,
    };
    Ok(AccountChangeSet {
        username,
        email,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::password::cheap_hasher;

    #[tokio::test]
    async fn create_hook_replaces_plaintext() {
        let hasher = cheap_hasher();
        let record = before_create(&hasher, NewAccount::new("ann", "ann@example.com", "pa55"))
            .await
            .unwrap();
        assert_eq!(record.username, "ann");
        assert_eq!(record.email, "ann@example.com");
        assert_ne!(record.password.as_str(), "pa55");
        assert!(hasher.verify("pa55", &record.password).unwrap());
    }

    #[tokio::test]
    async fn update_hook_hashes_only_when_password_present() {
        let hasher = cheap_hasher();

        let set = before_update(&hasher, AccountChanges::default().username("bob"))
            .await
            .unwrap();
        assert_eq!(set.username.as_deref(), Some("bob"));
        assert!(set.password.is_none());

        let set = before_update(&hasher, AccountChanges::default().password("n3w-pass"))
            .await
            .unwrap();
        let digest = set.password.expect("password should be hashed");
        assert!(hasher.verify("n3w-pass", &digest).unwrap());
    }
}
