use chrono::{SubsecRound, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::NewEntry;
use crate::database::{LedgerStore, LedgerUnit, StorageError};
use crate::types::AccountId;

/// Body of `POST /api/{account}`
///
/// `desc` is free text and an empty description is a valid entry, so it
/// defaults to "". `amount` has no neutral value: zero-filling it would post a
/// silent zero-amount entry from a typo'd or truncated body, so a body without
/// an integer `amount` is rejected as a bad request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionRequest {
    pub amount: i64,
    #[serde(rename = "desc", default)]
    pub description: String,
}

impl TransactionRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, StorageError> {
        serde_json::from_slice(body).map_err(|e| StorageError::BadRequest(e.to_string()))
    }
}

/// Posts transactions: balance delta and log append, committed together or not at all.
#[derive(Clone)]
pub struct LedgerWriter {
    store: Arc<dyn LedgerStore>,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Amounts are not bounded and balances may go negative.
    /// There is no idempotency key; a retried request posts twice.
    pub async fn post_transaction(
        &self,
        account: AccountId,
        subject: &str,
        amount: i64,
        description: &str,
    ) -> Result<(), StorageError> {
        let entry = NewEntry {
            account,
            subject: subject.to_string(),
            posted_at: Utc::now().trunc_subsecs(0),
            amount,
            description: description.to_string(),
        };

        let mut unit = self.store.begin().await?;

        if let Err(err) = apply(unit.as_mut(), &entry).await {
            if let Err(rollback_err) = unit.rollback().await {
                tracing::error!("Rollback failed for account {}: {}", account, rollback_err);
            }
            return Err(err);
        }
        unit.commit().await?;

        tracing::info!(
            "Posted transaction: account={} subject={} amount={}",
            account,
            entry.subject,
            entry.amount
        );
        Ok(())
    }
}

async fn apply(unit: &mut dyn LedgerUnit, entry: &NewEntry) -> Result<(), StorageError> {
    let touched = unit.adjust_balance(entry.account, entry.amount).await?;
    if touched == 0 {
        return Err(StorageError::NotFound(entry.account));
    }
    unit.append_entry(entry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Fault, MemoryLedger};
    use crate::testing::account;

    async fn ledger_with(balance: i64) -> (LedgerWriter, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.open_account(account(42), balance).await;
        (LedgerWriter::new(ledger.clone()), ledger)
    }

    #[test]
    fn decodes_request_body() {
        let req = TransactionRequest::from_body(br#"{"amount": -30, "desc": "withdraw"}"#).unwrap();
        assert_eq!(req, TransactionRequest { amount: -30, description: "withdraw".into() });

        let req = TransactionRequest::from_body(br#"{"amount": 5}"#).unwrap();
        assert_eq!(req.description, "");
    }

    #[test]
    fn amount_is_required_but_desc_is_not() {
        assert!(matches!(
            TransactionRequest::from_body(br#"{"desc": "pocket money"}"#),
            Err(StorageError::BadRequest(_))
        ));
        let req = TransactionRequest::from_body(br#"{"amount": 0}"#).unwrap();
        assert_eq!(req, TransactionRequest { amount: 0, description: String::new() });
    }

    #[test]
    fn rejects_undecodable_bodies() {
        let bodies: [&[u8]; 5] = [b"not json", br#"{"desc": "x"}"#, br#"{"amount": 1.5}"#, br#"{"amount": "10"}"#, b""];
        for body in bodies {
            assert!(matches!(TransactionRequest::from_body(body), Err(StorageError::BadRequest(_))));
        }
    }

    #[tokio::test]
    async fn posts_delta_and_entry() {
        let (writer, ledger) = ledger_with(100).await;
        writer.post_transaction(account(42), "auth0|mum", -30, "withdraw").await.unwrap();

        assert_eq!(ledger.balance(account(42)).await.unwrap(), 70);
        let entries = ledger.entries(account(42)).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "auth0|mum");
        assert_eq!(entries[0].amount, -30);
        assert_eq!(entries[0].description, "withdraw");
        assert_eq!(entries[0].posted_at.timestamp_subsec_nanos(), 0);
    }

    #[tokio::test]
    async fn balance_may_go_negative() {
        let (writer, ledger) = ledger_with(10).await;
        writer.post_transaction(account(42), "auth0|mum", -1_000, "big spend").await.unwrap();
        assert_eq!(ledger.balance(account(42)).await.unwrap(), -990);
    }

    #[tokio::test]
    async fn failed_append_rolls_back_delta() {
        let (writer, ledger) = ledger_with(100).await;
        ledger.inject_fault(Fault::AppendEntry).await;

        let result = writer.post_transaction(account(42), "auth0|mum", 25, "gift").await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert_eq!(ledger.balance(account(42)).await.unwrap(), 100);
        assert!(ledger.entries(account(42)).await.is_empty());
    }

    #[tokio::test]
    async fn failed_delta_appends_nothing() {
        let (writer, ledger) = ledger_with(100).await;
        ledger.inject_fault(Fault::AdjustBalance).await;

        assert!(writer.post_transaction(account(42), "auth0|mum", 25, "gift").await.is_err());
        assert_eq!(ledger.balance(account(42)).await.unwrap(), 100);
        assert!(ledger.entries(account(42)).await.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_changes_nothing() {
        let (writer, ledger) = ledger_with(100).await;
        ledger.inject_fault(Fault::Commit).await;

        assert!(writer.post_transaction(account(42), "auth0|mum", 25, "gift").await.is_err());
        assert_eq!(ledger.balance(account(42)).await.unwrap(), 100);
        assert!(ledger.entries(account(42)).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_account_is_not_found_and_leaves_no_entry() {
        let (writer, ledger) = ledger_with(100).await;
        let result = writer.post_transaction(account(7), "auth0|mum", 25, "gift").await;
        assert!(matches!(result, Err(StorageError::NotFound(a)) if a == account(7)));
        assert!(ledger.entries(account(7)).await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_posts_lose_no_delta() {
        let (writer, ledger) = ledger_with(0).await;

        let tasks: Vec<_> = (1..=50)
            .map(|i| {
                let writer = writer.clone();
                tokio::spawn(async move { writer.post_transaction(account(42), "auth0|mum", i, "tick").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let entries = ledger.entries(account(42)).await;
        assert_eq!(entries.len(), 50);
        assert_eq!(ledger.balance(account(42)).await.unwrap(), (1..=50).sum::<i64>());
        assert_eq!(entries.iter().map(|e| e.amount).sum::<i64>(), (1..=50).sum::<i64>());
    }
}
