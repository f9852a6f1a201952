//! PostgreSQL [`ValueLedger`] using sqlx.
//!
//! Ids come from a `BIGSERIAL`, timestamps from `clock_timestamp()`, so both
//! are assigned by the server. Appends hold a transaction-scoped advisory
//! lock so `observed_at` never decreases as `id` grows, even with several
//! writers. Reads order by `id DESC`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::schema::DatabaseConfig;
use crate::ledger::types::{LedgerError, LedgerRecord, LedgerResult, PageRequest, RecordSource};
use crate::ledger::ValueLedger;

impl LedgerRecord {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let source: String = row.try_get("source")?;
        Ok(Self {
            id: row.try_get("id")?,
            value: row.try_get("value")?,
            observed_at: row.try_get("observed_at")?,
            tx_hash: row.try_get("tx_hash")?,
            source: source.parse().map_err(|e: LedgerError| sqlx::Error::ColumnDecode {
                index: "source".to_string(),
                source: Box::new(e),
            })?,
        })
    }
}

/// Ledger stored in the `contract_values` table.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the database section of the service config.
    ///
    /// # Errors
    /// Returns an error if the pool cannot reach the server.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "Database pool connected");
        Ok(Self::new(pool))
    }

    /// Create the table and indexes if missing.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_contract_values.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drain and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

/// Advisory lock key serializing appends to `contract_values`.
const APPEND_LOCK_KEY: i64 = 0x7661_6c75_6573;

fn write_err(context: &str, e: sqlx::Error) -> LedgerError {
    LedgerError::Write(format!("{}: {}", context, e))
}

fn read_err(context: &str, e: sqlx::Error) -> LedgerError {
    LedgerError::Read(format!("{}: {}", context, e))
}

#[async_trait]
impl ValueLedger for PgLedger {
    async fn append(
        &self,
        value: &str,
        tx_hash: Option<&str>,
        source: RecordSource,
    ) -> LedgerResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| write_err("failed to begin append", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_err("failed to lock ledger", e))?;

        sqlx::query(
            r#"
            INSERT INTO contract_values (value, tx_hash, source)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(value)
        .bind(tx_hash)
        .bind(source.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err("failed to store value", e))?;

        tx.commit()
            .await
            .map_err(|e| write_err("failed to commit append", e))?;
        Ok(())
    }

    async fn latest(&self) -> LedgerResult<Option<LedgerRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, value, observed_at, tx_hash, source
            FROM contract_values
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_err("failed to get latest value", e))?;

        row.as_ref()
            .map(LedgerRecord::from_row)
            .transpose()
            .map_err(|e| read_err("failed to decode row", e))
    }

    async fn history(&self, page: PageRequest) -> LedgerResult<Vec<LedgerRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, value, observed_at, tx_hash, source
            FROM contract_values
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_err("failed to get value history", e))?;

        rows.iter()
            .map(LedgerRecord::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| read_err("failed to decode row", e))
    }

    async fn last_sync_timestamp(&self) -> LedgerResult<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT observed_at
            FROM contract_values
            WHERE source = 'sync'
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_err("failed to get last sync time", e))?;

        Ok(row.map(|(ts,)| ts))
    }

    async fn ping(&self) -> LedgerResult<DateTime<Utc>> {
        let (now,): (DateTime<Utc>,) = sqlx::query_as("SELECT now()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| read_err("database ping failed", e))?;
        Ok(now)
    }
}
