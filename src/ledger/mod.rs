//! Append-only history of observed contract values.
//!
//! # Data Flow
//! ```text
//! reconcile (set-then-record, sync)
//!     → ValueLedger::append
//!     → postgres.rs (contract_values table) | memory.rs (tests)
//!
//! http (history, status, check)
//!     → latest / history / last_sync_timestamp
//! ```

pub mod memory;
pub mod postgres;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemoryLedger;
pub use postgres::PgLedger;
pub use types::{LedgerError, LedgerRecord, LedgerResult, PageRequest, RecordSource};

/// Append-only store of observed values.
///
/// Write failures are [`LedgerError::Write`], everything else is
/// [`LedgerError::Read`]. Implementations never retry.
#[async_trait]
pub trait ValueLedger: Send + Sync {
    /// Insert one record; id and timestamp are assigned by the store.
    /// Consecutive duplicate values are legal.
    async fn append(
        &self,
        value: &str,
        tx_hash: Option<&str>,
        source: RecordSource,
    ) -> LedgerResult<()>;

    /// Most recent record, or `None` on an empty ledger.
    async fn latest(&self) -> LedgerResult<Option<LedgerRecord>>;

    /// A page of records, newest first. The caller normalizes the page.
    async fn history(&self, page: PageRequest) -> LedgerResult<Vec<LedgerRecord>>;

    /// Timestamp of the newest `sync` record.
    async fn last_sync_timestamp(&self) -> LedgerResult<Option<DateTime<Utc>>>;

    /// Round-trip to the store, returning its clock.
    async fn ping(&self) -> LedgerResult<DateTime<Utc>>;
}
