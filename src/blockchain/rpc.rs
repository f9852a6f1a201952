//! The chain RPC boundary.
//!
//! Everything above this trait (connector, submitter, reconciliation) is
//! node-agnostic. [`BlockchainClient`](crate::blockchain::BlockchainClient)
//! implements it over JSON-RPC; tests substitute a scripted double.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, Receipt};

/// Primitive node operations consumed by the value client.
///
/// Implementations report transport failures as
/// [`BlockchainError::Rpc`](crate::blockchain::BlockchainError::Rpc) or
/// [`BlockchainError::Timeout`](crate::blockchain::BlockchainError::Timeout);
/// callers wrap them with the step that failed.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Execute a read-only call against the latest state.
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes>;

    /// Transaction count of `address` including pending transactions.
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// Suggested gas price in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64>;

    /// Broadcast an EIP-2718 encoded signed transaction.
    async fn send_raw_transaction(&self, encoded: Bytes) -> BlockchainResult<TxHash>;

    /// `None` while the transaction is not yet mined.
    async fn transaction_receipt(&self, hash: TxHash) -> BlockchainResult<Option<Receipt>>;

    async fn chain_id(&self) -> BlockchainResult<u64>;

    async fn block_number(&self) -> BlockchainResult<u64>;

    async fn balance(&self, address: Address) -> BlockchainResult<U256>;
}
