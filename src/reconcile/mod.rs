//! Ledger/chain reconciliation.

pub mod engine;
pub mod types;

pub use engine::ReconciliationEngine;
pub use types::{CheckReport, ReconcileError, ReconcileResult, SetOutcome, SyncReport};
