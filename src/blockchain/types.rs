//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
///
/// Each variant names the step that failed. Nothing in this crate retries
/// on its own; see [`BlockchainError::is_retryable`] for the caller's policy.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Contract address missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Read-only contract call or network query failed.
    #[error("Chain call failed: {0}")]
    ChainCall(String),

    #[error("Failed to get nonce: {0}")]
    NonceFetch(String),

    #[error("Failed to get gas price: {0}")]
    FeeFetch(String),

    /// Contract arguments could not be encoded.
    #[error("Failed to encode contract call: {0}")]
    Encoding(String),

    #[error("Failed to estimate gas: {0}")]
    GasEstimation(String),

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    #[error("Failed to send transaction: {0}")]
    Submission(String),

    #[error("Failed to get transaction receipt: {0}")]
    Receipt(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Whether a caller may retry the failed operation with fresh inputs.
    ///
    /// Remote-call failures are retryable. Configuration, encoding and key
    /// problems need a human.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BlockchainError::Config(_)
                | BlockchainError::Encoding(_)
                | BlockchainError::Wallet(_)
                | BlockchainError::ChainMismatch { .. }
        )
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Handle for a submitted, not yet confirmed, transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionHandle {
    /// Transaction hash.
    pub hash: TxHash,
    /// Signer nonce consumed by this transaction.
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit taken from the node's estimate.
    pub gas_limit: u64,
}

/// Inclusion proof for a transaction, reduced to what callers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// False when the transaction was included but reverted.
    pub success: bool,
}

/// Network metadata for the connected node and signer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub block_number: u64,
    pub account: Address,
    /// Signer balance in wei, as a decimal string.
    pub balance: String,
}
