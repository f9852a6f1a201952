//! Keeps the ledger consistent with the on-chain value.
//!
//! # Attempt lifecycle
//! ```text
//! Start → ReadLedger → ReadChain ─┬─ equal ──→ NoChange
//!                                 └─ differ ─→ Drift → Append → Appended
//! any read failure ─→ Failed (ledger untouched)
//! ```

use alloy::primitives::U256;
use chrono::Utc;
use std::sync::Arc;

use crate::blockchain::{contract, BlockchainResult, ChainConnector, TxSubmitter};
use crate::ledger::{RecordSource, ValueLedger};
use crate::observability::metrics;
use crate::reconcile::types::{CheckReport, ReconcileResult, SetOutcome, SyncReport};

/// Compares chain truth against the ledger and appends when they drift.
pub struct ReconciliationEngine {
    connector: Arc<ChainConnector>,
    submitter: Arc<TxSubmitter>,
    ledger: Arc<dyn ValueLedger>,
    contract_address: String,
}

impl ReconciliationEngine {
    pub fn new(
        connector: Arc<ChainConnector>,
        submitter: Arc<TxSubmitter>,
        ledger: Arc<dyn ValueLedger>,
        contract_address: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            submitter,
            ledger,
            contract_address: contract_address.into(),
        }
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    fn require_contract(&self) -> BlockchainResult<()> {
        contract::parse_contract_address(&self.contract_address).map(|_| ())
    }

    /// Current on-chain value. Never cached.
    pub async fn current_value(&self) -> ReconcileResult<U256> {
        self.require_contract()?;
        Ok(self.connector.read_value(&self.contract_address).await?)
    }

    /// Append the on-chain value if it differs from the ledger's latest.
    ///
    /// Idempotent while the chain value does not change.
    pub async fn sync(&self) -> ReconcileResult<SyncReport> {
        self.require_contract()?;

        let previous_value = self
            .ledger
            .latest()
            .await?
            .map(|record| record.value)
            .unwrap_or_default();

        let current_value = self
            .connector
            .read_value(&self.contract_address)
            .await?
            .to_string();

        let updated = previous_value != current_value;
        if updated {
            self.ledger
                .append(&current_value, None, RecordSource::Sync)
                .await?;
            metrics::record_ledger_append(RecordSource::Sync);
            tracing::info!(
                previous = %previous_value,
                current = %current_value,
                "Drift detected, ledger updated"
            );
        } else {
            tracing::debug!(value = %current_value, "Ledger in sync");
        }
        metrics::record_sync(updated);

        Ok(SyncReport {
            previous_value,
            current_value,
            updated,
            timestamp: Utc::now(),
        })
    }

    /// Compare ledger and chain without writing.
    pub async fn check(&self) -> ReconcileResult<CheckReport> {
        self.require_contract()?;

        let database_value = self
            .ledger
            .latest()
            .await?
            .map(|record| record.value)
            .unwrap_or_default();
        let last_sync_time = self.ledger.last_sync_timestamp().await?;

        let blockchain_value = self
            .connector
            .read_value(&self.contract_address)
            .await?
            .to_string();

        Ok(CheckReport {
            in_sync: database_value == blockchain_value,
            database_value,
            blockchain_value,
            last_sync_time,
        })
    }

    /// Write `value` on-chain, then record it with its transaction hash.
    ///
    /// A failed append after a successful submission is reported as
    /// [`SetOutcome::Unrecorded`], not as an error: the chain changed.
    pub async fn set_and_record(&self, value: U256) -> ReconcileResult<SetOutcome> {
        self.require_contract()?;

        let handle = self
            .submitter
            .submit_set(&self.contract_address, value)
            .await?;

        let value = value.to_string();
        let tx_hash = handle.hash.to_string();

        match self
            .ledger
            .append(&value, Some(&tx_hash), RecordSource::Blockchain)
            .await
        {
            Ok(()) => {
                metrics::record_ledger_append(RecordSource::Blockchain);
                Ok(SetOutcome::Recorded { value, tx_hash })
            }
            Err(error) => {
                tracing::error!(
                    tx_hash = %tx_hash,
                    value = %value,
                    error = %error,
                    "Value set on chain but ledger append failed"
                );
                Ok(SetOutcome::Unrecorded {
                    value,
                    tx_hash,
                    error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{Method, MockRpc, TEST_CONTRACT};
    use crate::blockchain::BlockchainError;
    use crate::ledger::{
        InMemoryLedger, LedgerError, LedgerRecord, LedgerResult, PageRequest,
    };
    use crate::reconcile::types::ReconcileError;
    use async_trait::async_trait;
    use chrono::DateTime;

    /// Ledger whose reads or writes can be switched off.
    #[derive(Default)]
    struct FlakyLedger {
        inner: InMemoryLedger,
        fail_writes: bool,
        fail_reads: bool,
    }

    #[async_trait]
    impl ValueLedger for FlakyLedger {
        async fn append(
            &self,
            value: &str,
            tx_hash: Option<&str>,
            source: RecordSource,
        ) -> LedgerResult<()> {
            if self.fail_writes {
                return Err(LedgerError::Write("connection reset".into()));
            }
            self.inner.append(value, tx_hash, source).await
        }

        async fn latest(&self) -> LedgerResult<Option<LedgerRecord>> {
            if self.fail_reads {
                return Err(LedgerError::Read("connection reset".into()));
            }
            self.inner.latest().await
        }

        async fn history(&self, page: PageRequest) -> LedgerResult<Vec<LedgerRecord>> {
            self.inner.history(page).await
        }

        async fn last_sync_timestamp(&self) -> LedgerResult<Option<DateTime<Utc>>> {
            self.inner.last_sync_timestamp().await
        }

        async fn ping(&self) -> LedgerResult<DateTime<Utc>> {
            self.inner.ping().await
        }
    }

    fn engine_with(
        rpc: &MockRpc,
        ledger: Arc<dyn ValueLedger>,
        contract: &str,
    ) -> ReconciliationEngine {
        let connector = rpc.connector();
        let submitter = Arc::new(TxSubmitter::new(connector.clone()));
        ReconciliationEngine::new(connector, submitter, ledger, contract)
    }

    fn engine(rpc: &MockRpc, ledger: &InMemoryLedger) -> ReconciliationEngine {
        engine_with(rpc, Arc::new(ledger.clone()), TEST_CONTRACT)
    }

    #[tokio::test]
    async fn test_sync_on_empty_ledger_always_updates() {
        let rpc = MockRpc::new();
        rpc.set_stored(0);
        let ledger = InMemoryLedger::new();

        let report = engine(&rpc, &ledger).sync().await.unwrap();
        assert_eq!(report.previous_value, "");
        assert_eq!(report.current_value, "0");
        assert!(report.updated);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_sync_detects_drift() {
        let rpc = MockRpc::new();
        let ledger = InMemoryLedger::new();
        ledger.append("10", None, RecordSource::Sync).await.unwrap();
        rpc.set_stored(25);

        let report = engine(&rpc, &ledger).sync().await.unwrap();
        assert_eq!(report.previous_value, "10");
        assert_eq!(report.current_value, "25");
        assert!(report.updated);

        let records = ledger.records().await;
        assert_eq!(records.len(), 2);
        let appended = &records[1];
        assert_eq!(appended.value, "25");
        assert_eq!(appended.source, RecordSource::Sync);
        assert!(appended.tx_hash.is_none());
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let rpc = MockRpc::new();
        rpc.set_stored(25);
        let ledger = InMemoryLedger::new();
        let engine = engine(&rpc, &ledger);

        assert!(engine.sync().await.unwrap().updated);
        let second = engine.sync().await.unwrap();
        assert!(!second.updated);
        assert_eq!(second.previous_value, "25");
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_sync_chain_failure_leaves_ledger_untouched() {
        let rpc = MockRpc::new();
        rpc.fail(Method::Call);
        let ledger = InMemoryLedger::new();

        let err = engine(&rpc, &ledger).sync().await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Chain(BlockchainError::ChainCall(_))
        ));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_sync_ledger_read_failure_skips_chain() {
        let rpc = MockRpc::new();
        let ledger = FlakyLedger {
            fail_reads: true,
            ..FlakyLedger::default()
        };

        let err = engine_with(&rpc, Arc::new(ledger), TEST_CONTRACT)
            .sync()
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Ledger(LedgerError::Read(_))));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn test_check_in_sync() {
        let rpc = MockRpc::new();
        rpc.set_stored(25);
        let ledger = InMemoryLedger::new();
        ledger.append("25", None, RecordSource::Sync).await.unwrap();

        let report = engine(&rpc, &ledger).check().await.unwrap();
        assert!(report.in_sync);
        assert_eq!(report.database_value, "25");
        assert_eq!(report.blockchain_value, "25");
        assert!(report.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn test_check_drift_does_not_write() {
        let rpc = MockRpc::new();
        rpc.set_stored(30);
        let ledger = InMemoryLedger::new();
        ledger
            .append("25", Some("0x01"), RecordSource::Blockchain)
            .await
            .unwrap();

        let report = engine(&rpc, &ledger).check().await.unwrap();
        assert!(!report.in_sync);
        assert_eq!(report.blockchain_value, "30");
        assert!(report.last_sync_time.is_none());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_records_with_tx_hash() {
        let rpc = MockRpc::new();
        let ledger = InMemoryLedger::new();

        let outcome = engine(&rpc, &ledger)
            .set_and_record(U256::from(42))
            .await
            .unwrap();
        assert!(outcome.is_recorded());
        assert_eq!(outcome.value(), "42");
        assert!(!outcome.tx_hash().is_empty());

        let latest = ledger.latest().await.unwrap().unwrap();
        assert_eq!(latest.value, "42");
        assert_eq!(latest.source, RecordSource::Blockchain);
        assert_eq!(latest.tx_hash.as_deref(), Some(outcome.tx_hash()));
    }

    #[tokio::test]
    async fn test_set_with_failed_append_is_partial_success() {
        let rpc = MockRpc::new();
        let ledger = FlakyLedger {
            fail_writes: true,
            ..FlakyLedger::default()
        };

        let outcome = engine_with(&rpc, Arc::new(ledger), TEST_CONTRACT)
            .set_and_record(U256::from(42))
            .await
            .unwrap();

        match outcome {
            SetOutcome::Unrecorded {
                value,
                tx_hash,
                error,
            } => {
                assert_eq!(value, "42");
                assert!(tx_hash.starts_with("0x"));
                assert!(matches!(error, LedgerError::Write(_)));
            }
            other => panic!("expected partial success, got {:?}", other),
        }
        assert_eq!(rpc.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_set_chain_failure_writes_nothing() {
        let rpc = MockRpc::new();
        rpc.fail(Method::EstimateGas);
        let ledger = InMemoryLedger::new();

        let err = engine(&rpc, &ledger)
            .set_and_record(U256::from(42))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Chain(BlockchainError::GasEstimation(_))
        ));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_unconfigured_contract_touches_nothing() {
        let rpc = MockRpc::new();
        let ledger = InMemoryLedger::new();
        let engine = engine_with(&rpc, Arc::new(ledger.clone()), "");

        for err in [
            engine.sync().await.unwrap_err(),
            engine.check().await.unwrap_err(),
            engine.set_and_record(U256::from(1)).await.unwrap_err(),
            engine.current_value().await.unwrap_err(),
        ] {
            assert!(matches!(err, ReconcileError::Chain(BlockchainError::Config(_))));
        }
        assert!(rpc.calls().is_empty());
        assert!(ledger.is_empty().await);
    }
}
