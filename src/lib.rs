pub mod account;
pub mod config;
pub mod db;
pub mod error;

pub use error::{AccountError, AccountResult};
