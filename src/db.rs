use std::sync::Arc;

use anyhow::Context;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::account::{AccountStore, PgAccountRepository};
use crate::config::AppConfig;

/// Creates the `user` table and any later schema changes.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub accounts: AccountStore,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Self::from_parts(db, &config)
    }

    pub fn from_parts(db: PgPool, config: &AppConfig) -> anyhow::Result<Self> {
        let repo = Arc::new(PgAccountRepository::new(db.clone()));
        let accounts = AccountStore::new(repo, config.hasher()?);
        Ok(Self { db, accounts })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.db).await.context("run migrations")?;
        Ok(())
    }
}
