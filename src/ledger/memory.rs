//! In-memory [`ValueLedger`] for tests and store-less runs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ledger::types::{LedgerRecord, LedgerResult, PageRequest, RecordSource};
use crate::ledger::ValueLedger;

/// Vector-backed ledger. Timestamps are strictly increasing with `id`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    records: Arc<RwLock<Vec<LedgerRecord>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All records, oldest first.
    pub async fn records(&self) -> Vec<LedgerRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ValueLedger for InMemoryLedger {
    async fn append(
        &self,
        value: &str,
        tx_hash: Option<&str>,
        source: RecordSource,
    ) -> LedgerResult<()> {
        let mut records = self.records.write().await;

        let mut observed_at = Utc::now();
        if let Some(last) = records.last() {
            if observed_at <= last.observed_at {
                observed_at = last.observed_at + Duration::microseconds(1);
            }
        }

        let id = records.len() as i64 + 1;
        records.push(LedgerRecord {
            id,
            value: value.to_string(),
            observed_at,
            tx_hash: tx_hash.map(str::to_string),
            source,
        });
        Ok(())
    }

    async fn latest(&self) -> LedgerResult<Option<LedgerRecord>> {
        Ok(self.records.read().await.last().cloned())
    }

    async fn history(&self, page: PageRequest) -> LedgerResult<Vec<LedgerRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn last_sync_timestamp(&self) -> LedgerResult<Option<DateTime<Utc>>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.source == RecordSource::Sync)
            .map(|r| r.observed_at))
    }

    async fn ping(&self) -> LedgerResult<DateTime<Utc>> {
        Ok(Utc::now())
    }
}
