pub mod manager;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::ledger::{LedgerEntry, NewEntry};
use crate::types::AccountId;

#[cfg(any(test, feature = "testing"))]
pub use memory::{Fault, MemoryLedger};
pub use postgres::PgLedgerStore;

/// Errors from the ledger store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Account {0} not found")]
    NotFound(AccountId),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("Storage failure: {0}")]
    Backend(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One history row: decoded, or the reason it could not be.
pub type HistoryRow = Result<LedgerEntry, StorageError>;

/// Read access to balances and history, plus the entry point for atomic writes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current balance; `StorageError::NotFound` when the account row is missing.
    async fn balance(&self, account: AccountId) -> Result<i64, StorageError>;

    /// Newest-first window of history. The outer error is fatal; inner errors
    /// are per-row decode failures left to the caller's policy.
    async fn history(&self, account: AccountId, limit: i64, offset: i64) -> Result<Vec<HistoryRow>, StorageError>;

    /// Opens one all-or-nothing unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}

/// An open transaction. Dropping it without `commit` discards every change.
#[async_trait]
pub trait LedgerUnit: Send {
    /// `balance = balance + delta`, evaluated by the store. Returns rows touched.
    async fn adjust_balance(&mut self, account: AccountId, delta: i64) -> Result<u64, StorageError>;

    async fn append_entry(&mut self, entry: &NewEntry) -> Result<(), StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}
