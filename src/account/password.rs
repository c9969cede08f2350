use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AccountError, AccountResult};

/// PHC-encoded Argon2id digest as stored in the `password` column.
///
/// Only the [`Hasher`] and row decoding can build one, so a write record
/// holding a `PasswordDigest` never carries a plaintext secret.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Salted one-way password hashing with a configurable work factor.
#[derive(Debug, Clone)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    pub const DEFAULT_COST: u32 = 10;
    pub const DEFAULT_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;

    /// `cost` is the Argon2 time cost (number of passes over memory).
    pub fn new(cost: u32) -> AccountResult<Self> {
        Self::with_memory(cost, Self::DEFAULT_MEMORY_KIB)
    }

    pub fn with_memory(cost: u32, memory_kib: u32) -> AccountResult<Self> {
        let params = Params::new(memory_kib, cost, Params::DEFAULT_P_COST, None).map_err(|e| {
            error!(error = %e, cost, memory_kib, "invalid argon2 params");
            AccountError::Hashing(e.to_string())
        })?;
        Ok(Self { params })
    }

    pub fn cost(&self) -> u32 {
        self.params.t_cost()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes on the current thread. Prefer [`Hasher::hash`] inside async code.
    pub fn hash_blocking(&self, plain: &str) -> AccountResult<PasswordDigest> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AccountError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(PasswordDigest(hash))
    }

    /// Hashes on the blocking pool so only the calling task waits.
    pub async fn hash(&self, plain: String) -> AccountResult<PasswordDigest> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&plain))
            .await
            .map_err(|e| {
                error!(error = %e, "hashing task failed");
                AccountError::Hashing(e.to_string())
            })?
    }

    /// Parameters are read back from the digest, so digests produced under
    /// an older work factor still verify.
    pub fn verify(&self, plain: &str, digest: &PasswordDigest) -> AccountResult<bool> {
        verify_password(plain, digest.as_str())
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self {
            params: Params::new(
                Self::DEFAULT_MEMORY_KIB,
                Self::DEFAULT_COST,
                Params::DEFAULT_P_COST,
                None,
            )
            .unwrap_or_default(),
        }
    }
}

pub fn verify_password(plain: &str, hash: &str) -> AccountResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AccountError::Hashing(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Hasher {
    Hasher::with_memory(1, 64).expect("cheap params are valid")
}
