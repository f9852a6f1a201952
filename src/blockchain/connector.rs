//! Read side of the value client: contract reads and network metadata.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;

use crate::blockchain::contract;
use crate::blockchain::rpc::ChainRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult, NetworkInfo};
use crate::blockchain::wallet::Wallet;

/// Node connection plus the process's signing account.
///
/// Built once at startup and shared by `Arc`; [`ChainConnector::close`] is
/// called once after the server has stopped.
pub struct ChainConnector {
    rpc: Arc<dyn ChainRpc>,
    wallet: Wallet,
}

impl ChainConnector {
    pub fn new(rpc: Arc<dyn ChainRpc>, wallet: Wallet) -> Self {
        Self { rpc, wallet }
    }

    /// Read the current stored value.
    ///
    /// # Errors
    /// - `Config` if `contract_address` is empty or malformed; no RPC is made
    /// - `ChainCall` if the call fails or the result is not a `uint256`
    pub async fn read_value(&self, contract_address: &str) -> BlockchainResult<U256> {
        let to = contract::parse_contract_address(contract_address)?;

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(contract::encode_get());

        let data = self
            .rpc
            .call(tx)
            .await
            .map_err(chain_call("failed to call contract"))?;

        contract::decode_get(&data)
    }

    /// Chain ID, head block and signer balance. No side effects.
    pub async fn network_info(&self) -> BlockchainResult<NetworkInfo> {
        let chain_id = self
            .rpc
            .chain_id()
            .await
            .map_err(chain_call("failed to get chain ID"))?;

        let block_number = self
            .rpc
            .block_number()
            .await
            .map_err(chain_call("failed to get block number"))?;

        let balance = self
            .rpc
            .balance(self.address())
            .await
            .map_err(chain_call("failed to get balance"))?;

        Ok(NetworkInfo {
            chain_id,
            block_number,
            account: self.address(),
            balance: balance.to_string(),
        })
    }

    /// Signer account address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub(crate) fn rpc(&self) -> &dyn ChainRpc {
        self.rpc.as_ref()
    }

    pub(crate) fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Log connector teardown.
    ///
    /// The HTTP transport opens a request per call and keeps no session with
    /// the node, so there is nothing to release beyond the `Arc` handles
    /// dropped by the caller.
    pub fn close(&self) {
        tracing::info!(account = %self.address(), "Chain connector closed");
    }
}

/// Wrap a node failure with the step that failed. Timeouts stay timeouts.
fn chain_call(context: &'static str) -> impl FnOnce(BlockchainError) -> BlockchainError {
    move |e| match e {
        BlockchainError::Timeout(_) => e,
        other => BlockchainError::ChainCall(format!("{}: {}", context, other)),
    }
}

impl std::fmt::Debug for ChainConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnector")
            .field("account", &self.address())
            .finish_non_exhaustive()
    }
}
