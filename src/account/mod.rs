pub mod dto;
pub(crate) mod hooks;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

pub use dto::{AccountChanges, NewAccount};
pub use memory::InMemoryAccountRepository;
pub use password::{Hasher, PasswordDigest};
pub use repo::{AccountRepository, PgAccountRepository};
pub use repo_types::{Account, AccountChangeSet, NewAccountRecord};
pub use services::AccountStore;
