use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::account::repo_types::{Account, AccountChangeSet, NewAccountRecord};
use crate::error::{AccountError, AccountResult};

/// Persistence for accounts. Writes only accept hashed records.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. The storage engine assigns the id.
    async fn insert(&self, record: NewAccountRecord) -> AccountResult<Account>;

    async fn find_by_id(&self, id: i32) -> AccountResult<Option<Account>>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>>;

    /// Accounts ordered by id.
    async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>>;

    /// Apply the change set; `None` fields keep their stored value.
    async fn update(&self, id: i32, changes: AccountChangeSet) -> AccountResult<Account>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> AccountResult<bool>;

    async fn count(&self) -> AccountResult<i64>;
}

/// Accounts stored in the PostgreSQL `user` table.
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    db: PgPool,
}

impl PgAccountRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error, email: Option<&str>) -> AccountError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AccountError::DuplicateEmail(email.unwrap_or_default().to_string());
        }
    }
    AccountError::Database(e)
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    #[instrument(skip(self, record), fields(email = %record.email()))]
    async fn insert(&self, record: NewAccountRecord) -> AccountResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO "user" (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password
            "#,
        )
        .bind(record.username())
        .bind(record.email())
        .bind(record.password())
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, Some(record.email())))?;

        info!(account_id = account.id, "account row inserted");
        Ok(account)
    }

    async fn find_by_id(&self, id: i32) -> AccountResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password
            FROM "user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password
            FROM "user"
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password
            FROM "user"
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: i32, changes: AccountChangeSet) -> AccountResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE "user"
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password = COALESCE($4, password)
            WHERE id = $1
            RETURNING id, username, email, password
            "#,
        )
        .bind(id)
        .bind(changes.username())
        .bind(changes.email())
        .bind(changes.password())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_error(e, changes.email()))?
        .ok_or(AccountError::NotFound(id))?;

        info!(account_id = id, "account row updated");
        Ok(account)
    }

    async fn delete(&self, id: i32) -> AccountResult<bool> {
        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AccountResult<i64> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
