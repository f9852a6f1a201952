//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Bound every call with the configured timeout
//! - Translate node responses into crate types
//! - Record per-method RPC metrics

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{TransportError, TransportResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::blockchain::rpc::ChainRpc;
use crate::blockchain::types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, Receipt,
};
use crate::observability::metrics;

/// Blockchain RPC client wrapper.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: BlockchainConfig,
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made here beyond URL parsing; an unreachable node only
    /// surfaces on the first call.
    pub fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider =
            Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        tracing::info!(rpc_url = %config.rpc_url, "Blockchain client initialized");

        Ok(Self {
            provider,
            config,
            timeout_duration,
        })
    }

    /// Verify the connected chain ID matches configuration.
    ///
    /// A configured chain ID of 0 accepts any chain.
    pub async fn verify_chain_id(&self) -> BlockchainResult<ChainId> {
        let actual = self.chain_id().await?;
        if self.config.chain_id != 0 && actual != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual,
            });
        }
        Ok(ChainId(actual))
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    async fn timed<T, F>(&self, method: &'static str, fut: F) -> BlockchainResult<T>
    where
        F: Future<Output = TransportResult<T>> + Send,
    {
        let start = Instant::now();
        let result = match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(method, error = %e, "RPC error");
                Err(BlockchainError::Rpc(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(method, "RPC timeout");
                Err(BlockchainError::Timeout(self.config.rpc_timeout_secs))
            }
        };
        metrics::record_rpc_call(method, result.is_ok(), start);
        result
    }
}

#[async_trait]
impl ChainRpc for BlockchainClient {
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.timed("eth_call", async { self.provider.call(tx).await })
            .await
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.timed("eth_getTransactionCount", async {
            self.provider.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.timed("eth_gasPrice", self.provider.get_gas_price())
            .await
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64> {
        self.timed("eth_estimateGas", async {
            self.provider.estimate_gas(tx).await
        })
        .await
    }

    async fn send_raw_transaction(&self, encoded: Bytes) -> BlockchainResult<TxHash> {
        self.timed("eth_sendRawTransaction", async {
            let pending = self.provider.send_raw_transaction(&encoded).await?;
            Ok::<_, TransportError>(*pending.tx_hash())
        })
        .await
    }

    async fn transaction_receipt(&self, hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        let receipt = self
            .timed(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?;

        Ok(receipt.map(|r| Receipt {
            transaction_hash: r.transaction_hash,
            block_number: r.block_number,
            gas_used: r.gas_used,
            success: r.status(),
        }))
    }

    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.timed("eth_chainId", self.provider.get_chain_id())
            .await
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.timed("eth_blockNumber", self.provider.get_block_number())
            .await
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.timed("eth_getBalance", async {
            self.provider.get_balance(address).await
        })
        .await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
