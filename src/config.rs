use anyhow::Context;
use serde::Deserialize;

use crate::account::Hasher;

#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
    pub cost: u32,
    pub memory_kib: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            cost: Hasher::DEFAULT_COST,
            memory_kib: Hasher::DEFAULT_MEMORY_KIB,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?;
        let defaults = HashConfig::default();
        let hash = HashConfig {
            cost: parse_or(&var, "ACCOUNT_HASH_COST", defaults.cost)?,
            memory_kib: parse_or(&var, "ACCOUNT_HASH_MEMORY_KIB", defaults.memory_kib)?,
        };
        Ok(Self {
            database_url,
            max_connections,
            hash,
        })
    }

    pub fn hasher(&self) -> anyhow::Result<Hasher> {
        Hasher::with_memory(self.hash.cost, self.hash.memory_kib)
            .context("invalid password hashing parameters")
    }
}

fn parse_or(var: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> anyhow::Result<u32> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{key} must be a positive integer, got {raw:?}")),
        None => Ok(default),
    }
}
