pub mod reader;
pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AccountId;

pub use reader::{LedgerReader, RowDecodePolicy};
pub use writer::{LedgerWriter, TransactionRequest};

/// Transactions per history page
pub const PAGE_SIZE: i64 = 10;

/// Zero-based history page. Built leniently from the `p` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page(u32);

impl Page {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Absent, negative, non-numeric or oversized input all mean page 0.
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse::<i64>().ok())
            .and_then(|p| u32::try_from(p).ok())
            .map(Page)
            .unwrap_or_default()
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn offset(self) -> i64 {
        i64::from(self.0) * PAGE_SIZE
    }
}

/// A committed transaction row as read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub posted_at: DateTime<Utc>,
    pub description: String,
    pub amount: i64,
}

/// A transaction about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub account: AccountId,
    pub subject: String,
    pub posted_at: DateTime<Utc>,
    pub amount: i64,
    pub description: String,
}

/// One history line in the account response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Unix seconds
    pub date: i64,
    pub comment: String,
    pub amount: i64,
}

impl From<LedgerEntry> for HistoryItem {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            date: entry.posted_at.timestamp(),
            comment: entry.description,
            amount: entry.amount,
        }
    }
}

/// Body of `GET /api/{account}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub balance: i64,
    pub transactions: Vec<HistoryItem>,
}
