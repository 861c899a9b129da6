use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};

use super::{HistoryRow, LedgerStore, LedgerUnit, StorageError};
use crate::ledger::{LedgerEntry, NewEntry};
use crate::types::AccountId;

const BALANCE_SQL: &str = "SELECT balance::BIGINT AS balance FROM account WHERE actno = $1";

// Epoch is taken in SQL so TIMESTAMP and TIMESTAMPTZ columns read the same way.
// FLOOR keeps sub-second rows on their whole second instead of rounding up.
// Only the legacy columns are referenced; rows sharing a second have no fixed order.
const HISTORY_SQL: &str = r#"
    SELECT
        FLOOR(EXTRACT(EPOCH FROM tstamp))::BIGINT AS posted_epoch,
        descr,
        amount::BIGINT AS amount
    FROM transactions
    WHERE act = $1
    ORDER BY tstamp DESC
    LIMIT $2 OFFSET $3
"#;

const ADJUST_BALANCE_SQL: &str = "UPDATE account SET balance = balance + $1 WHERE actno = $2";

const APPEND_ENTRY_SQL: &str =
    "INSERT INTO transactions (act, sub, tstamp, amount, descr) VALUES ($1, $2, $3, $4, $5)";

/// Ledger backed by the shared PostgreSQL pool
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_entry(row: &PgRow) -> HistoryRow {
    let decode = |e: sqlx::Error| StorageError::Decode(e.to_string());

    let epoch: i64 = row.try_get("posted_epoch").map_err(decode)?;
    let posted_at = DateTime::<Utc>::from_timestamp(epoch, 0)
        .ok_or_else(|| StorageError::Decode(format!("timestamp out of range: {}", epoch)))?;

    Ok(LedgerEntry {
        posted_at,
        description: row.try_get("descr").map_err(decode)?,
        amount: row.try_get("amount").map_err(decode)?,
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn balance(&self, account: AccountId) -> Result<i64, StorageError> {
        let row = sqlx::query(BALANCE_SQL)
            .bind(account.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound(account))?;

        Ok(row.try_get("balance")?)
    }

    async fn history(&self, account: AccountId, limit: i64, offset: i64) -> Result<Vec<HistoryRow>, StorageError> {
        let rows = sqlx::query(HISTORY_SQL)
            .bind(account.get())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(decode_entry).collect())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerUnit { tx }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One database transaction. sqlx rolls back on drop if neither commit nor
/// rollback ran, which covers cancelled requests.
struct PgLedgerUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn adjust_balance(&mut self, account: AccountId, delta: i64) -> Result<u64, StorageError> {
        let result = sqlx::query(ADJUST_BALANCE_SQL)
            .bind(delta)
            .bind(account.get())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn append_entry(&mut self, entry: &NewEntry) -> Result<(), StorageError> {
        sqlx::query(APPEND_ENTRY_SQL)
            .bind(entry.account.get())
            .bind(&entry.subject)
            .bind(entry.posted_at)
            .bind(entry.amount)
            .bind(&entry.description)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let PgLedgerUnit { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        let PgLedgerUnit { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
