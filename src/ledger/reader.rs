use std::sync::Arc;

use super::{AccountView, HistoryItem, Page, PAGE_SIZE};
use crate::database::{LedgerStore, StorageError};
use crate::types::AccountId;

/// What to do with a history row that fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowDecodePolicy {
    /// Log the row and return the rest of the page
    #[default]
    Skip,
    /// Fail the whole request
    Fail,
}

impl RowDecodePolicy {
    pub fn from_skip_flag(skip: bool) -> Self {
        if skip {
            RowDecodePolicy::Skip
        } else {
            RowDecodePolicy::Fail
        }
    }
}

/// Loads an account's balance together with one page of its history.
#[derive(Clone)]
pub struct LedgerReader {
    store: Arc<dyn LedgerStore>,
    policy: RowDecodePolicy,
}

impl LedgerReader {
    pub fn new(store: Arc<dyn LedgerStore>, policy: RowDecodePolicy) -> Self {
        Self { store, policy }
    }

    /// Balance errors are always fatal. Row errors follow the decode policy.
    pub async fn load_account(&self, account: AccountId, page: Page) -> Result<AccountView, StorageError> {
        let balance = self.store.balance(account).await?;
        let rows = self.store.history(account, PAGE_SIZE, page.offset()).await?;

        let mut transactions = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            match row {
                Ok(entry) => transactions.push(HistoryItem::from(entry)),
                Err(err) if self.policy == RowDecodePolicy::Skip => {
                    tracing::warn!(
                        "Skipping undecodable transaction row {} on page {} of account {}: {}",
                        index,
                        page.number(),
                        account,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(AccountView { balance, transactions })
    }
}
