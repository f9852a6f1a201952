//! Ledger record types and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a ledger record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Written after a successful local `set`.
    Blockchain,
    /// Written after sync detected drift.
    Sync,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Blockchain => "blockchain",
            RecordSource::Sync => "sync",
        }
    }
}

impl std::str::FromStr for RecordSource {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blockchain" => Ok(RecordSource::Blockchain),
            "sync" => Ok(RecordSource::Sync),
            other => Err(LedgerError::Read(format!("unknown record source '{}'", other))),
        }
    }
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed value. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Store-assigned, increasing.
    pub id: i64,
    /// Decimal encoding of the stored value.
    pub value: String,
    /// Store-assigned observation time.
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,
    /// Present only for records written after a local `set`.
    pub tx_hash: Option<String>,
    pub source: RecordSource,
}

/// Errors from the persistent store.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Failed to store value: {0}")]
    Write(String),

    #[error("Failed to read ledger: {0}")]
    Read(String),
}

impl LedgerError {
    /// Store failures are transient from the caller's point of view.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Write(_) | LedgerError::Read(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Default page size for history queries.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Normalized paging parameters for [`ValueLedger::history`](crate::ledger::ValueLedger::history).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Normalize raw query parameters.
    ///
    /// Out-of-range or unparsable input is replaced, never rejected: a limit
    /// outside `[1, 100]` becomes 10, a negative offset becomes 0.
    pub fn normalize(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        let offset = offset
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);

        Self { limit, offset }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}
