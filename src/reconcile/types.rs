//! Reconciliation results and errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::ledger::LedgerError;

/// Outcome of a sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Latest ledger value before the sync, `""` on an empty ledger.
    pub previous_value: String,
    pub current_value: String,
    /// Whether a record was appended.
    pub updated: bool,
    pub timestamp: DateTime<Utc>,
}

/// Read-only comparison of ledger and chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub database_value: String,
    pub blockchain_value: String,
    pub in_sync: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
}

/// Result of a write that reached the chain.
///
/// Together with `Err(ReconcileError)` this is the tri-state outcome of
/// set-then-record: recorded, on-chain only, or failed.
#[derive(Debug, Clone)]
pub enum SetOutcome {
    /// Transaction submitted and ledger record appended.
    Recorded { value: String, tx_hash: String },
    /// Transaction submitted but the ledger append failed; a later sync
    /// will pick the value up.
    Unrecorded {
        value: String,
        tx_hash: String,
        error: LedgerError,
    },
}

impl SetOutcome {
    pub fn tx_hash(&self) -> &str {
        match self {
            SetOutcome::Recorded { tx_hash, .. } | SetOutcome::Unrecorded { tx_hash, .. } => {
                tx_hash
            }
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SetOutcome::Recorded { value, .. } | SetOutcome::Unrecorded { value, .. } => value,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, SetOutcome::Recorded { .. })
    }
}

/// A reconciliation step failed; the ledger was not modified.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
