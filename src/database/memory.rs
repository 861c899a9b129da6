use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{HistoryRow, LedgerStore, LedgerUnit, StorageError};
use crate::ledger::{LedgerEntry, NewEntry};
use crate::types::AccountId;

/// Step at which the next unit of work should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    AdjustBalance,
    AppendEntry,
    Commit,
}

#[derive(Debug, Default)]
struct State {
    balances: HashMap<AccountId, i64>,
    /// Insertion order
    entries: Vec<NewEntry>,
    fault: Option<Fault>,
}

impl State {
    fn trip(&mut self, step: Fault) -> Result<(), StorageError> {
        if self.fault == Some(step) {
            self.fault = None;
            return Err(StorageError::Backend(format!("injected failure at {:?}", step)));
        }
        Ok(())
    }
}

/// A thread-safe in-memory ledger.
///
/// Writes are staged inside a unit and applied under a single write lock on
/// commit, so readers never observe a balance change without its entry.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<State>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an account with an opening balance (accounts are created out-of-band).
    pub async fn open_account(&self, account: AccountId, balance: i64) {
        self.state.write().await.balances.insert(account, balance);
    }

    /// Apply an already-committed entry directly, keeping balance and log in step.
    pub async fn seed_entry(&self, entry: NewEntry) {
        let mut state = self.state.write().await;
        *state.balances.entry(entry.account).or_insert(0) += entry.amount;
        state.entries.push(entry);
    }

    /// Every entry for `account`, oldest first.
    pub async fn entries(&self, account: AccountId) -> Vec<NewEntry> {
        let state = self.state.read().await;
        state.entries.iter().filter(|e| e.account == account).cloned().collect()
    }

    /// Make the next unit of work fail at `step`.
    pub async fn inject_fault(&self, step: Fault) {
        self.state.write().await.fault = Some(step);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn balance(&self, account: AccountId) -> Result<i64, StorageError> {
        let state = self.state.read().await;
        state.balances.get(&account).copied().ok_or(StorageError::NotFound(account))
    }

    async fn history(&self, account: AccountId, limit: i64, offset: i64) -> Result<Vec<HistoryRow>, StorageError> {
        let state = self.state.read().await;

        // Newest insert first, then a stable sort so equal timestamps keep that order
        let mut entries: Vec<&NewEntry> = state.entries.iter().rev().filter(|e| e.account == account).collect();
        entries.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| {
                Ok(LedgerEntry {
                    posted_at: e.posted_at,
                    description: e.description.clone(),
                    amount: e.amount,
                })
            })
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StorageError> {
        Ok(Box::new(MemoryUnit {
            state: self.state.clone(),
            deltas: Vec::new(),
            appended: Vec::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

struct MemoryUnit {
    state: Arc<RwLock<State>>,
    deltas: Vec<(AccountId, i64)>,
    appended: Vec<NewEntry>,
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn adjust_balance(&mut self, account: AccountId, delta: i64) -> Result<u64, StorageError> {
        let mut state = self.state.write().await;
        state.trip(Fault::AdjustBalance)?;
        if !state.balances.contains_key(&account) {
            return Ok(0);
        }
        self.deltas.push((account, delta));
        Ok(1)
    }

    async fn append_entry(&mut self, entry: &NewEntry) -> Result<(), StorageError> {
        self.state.write().await.trip(Fault::AppendEntry)?;
        self.appended.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryUnit { state, deltas, appended } = *self;
        let mut state = state.write().await;
        state.trip(Fault::Commit)?;
        for (account, delta) in deltas {
            *state.balances.entry(account).or_insert(0) += delta;
        }
        state.entries.extend(appended);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}
