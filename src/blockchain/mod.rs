//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (private key) + config (RPC URL, contract address)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (JSON-RPC with timeouts, implements rpc::ChainRpc)
//!     → connector.rs (contract reads, network info)
//!     → transaction.rs (nonce, fee, estimate, sign, broadcast, receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod connector;
pub mod contract;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

#[cfg(test)]
pub(crate) mod mock;

pub use client::BlockchainClient;
pub use connector::ChainConnector;
pub use rpc::ChainRpc;
pub use transaction::TxSubmitter;
pub use types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, NetworkInfo, Receipt,
    TransactionHandle,
};
pub use wallet::Wallet;
