//! Transaction building, signing, submission and confirmation polling.
//!
//! # Write sequence
//! 1. pending nonce for the signer
//! 2. gas price suggestion
//! 3. encode `set(value)`
//! 4. gas estimate (doubles as a revert pre-flight)
//! 5. build, fetch chain ID, sign
//! 6. broadcast
//!
//! The sequence runs under a per-signer lock so two writes from this
//! process never read the same pending nonce. Writers in other processes
//! sharing the key are not covered.

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::blockchain::connector::ChainConnector;
use crate::blockchain::contract;
use crate::blockchain::types::{BlockchainError, BlockchainResult, Receipt, TransactionHandle};

/// Submits state-changing calls from the connector's signer.
pub struct TxSubmitter {
    connector: Arc<ChainConnector>,
    signer_lock: Mutex<()>,
}

impl TxSubmitter {
    /// Create a new submitter for the connector's signing account.
    pub fn new(connector: Arc<ChainConnector>) -> Self {
        Self {
            connector,
            signer_lock: Mutex::new(()),
        }
    }

    /// Submit `set(value)` to the contract.
    ///
    /// Returns once the node accepted the transaction; inclusion is checked
    /// separately with [`TxSubmitter::wait_for_receipt`]. A nonce read for a
    /// failed attempt is not reused.
    pub async fn submit_set(
        &self,
        contract_address: &str,
        value: U256,
    ) -> BlockchainResult<TransactionHandle> {
        let to = contract::parse_contract_address(contract_address)?;
        let rpc = self.connector.rpc();
        let from = self.connector.address();

        let _guard = self.signer_lock.lock().await;

        let nonce = rpc
            .pending_nonce(from)
            .await
            .map_err(|e| BlockchainError::NonceFetch(e.to_string()))?;

        let gas_price = rpc
            .gas_price()
            .await
            .map_err(|e| BlockchainError::FeeFetch(e.to_string()))?;

        let data = contract::encode_set(value);

        let gas_limit = rpc
            .estimate_gas(
                TransactionRequest::default()
                    .with_from(from)
                    .with_to(to)
                    .with_input(data.clone()),
            )
            .await
            .map_err(|e| BlockchainError::GasEstimation(e.to_string()))?;

        let chain_id = rpc
            .chain_id()
            .await
            .map_err(|e| BlockchainError::Signing(format!("failed to get chain ID: {}", e)))?;

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_value(U256::ZERO)
            .with_input(data)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit)
            .with_chain_id(chain_id);

        let envelope = self.connector.wallet().sign_transaction(tx).await?;

        let hash = rpc
            .send_raw_transaction(envelope.encoded_2718().into())
            .await
            .map_err(|e| BlockchainError::Submission(e.to_string()))?;

        tracing::info!(
            tx_hash = %hash,
            nonce,
            gas_price,
            gas_limit,
            value = %value,
            "Transaction submitted"
        );

        Ok(TransactionHandle {
            hash,
            nonce,
            gas_price,
            gas_limit,
        })
    }

    /// Poll until the node reports the transaction's receipt.
    ///
    /// There is no deadline here; wrap the call in `tokio::time::timeout`.
    /// "Not yet mined" is not an error, an RPC failure is.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        poll_interval: Duration,
    ) -> BlockchainResult<Receipt> {
        let mut ticker = tokio::time::interval(poll_interval);

        loop {
            ticker.tick().await;

            match self.connector.rpc().transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        block_number = ?receipt.block_number,
                        success = receipt.success,
                        "Transaction included"
                    );
                    return Ok(receipt);
                }
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                }
                Err(e) => return Err(BlockchainError::Receipt(e.to_string())),
            }
        }
    }

    /// Connector whose signer this submitter uses.
    pub fn connector(&self) -> &ChainConnector {
        &self.connector
    }
}
