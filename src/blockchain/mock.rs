//! Scripted [`ChainRpc`] double for unit tests.

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::blockchain::rpc::ChainRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult, Receipt};
use crate::blockchain::wallet::Wallet;
use crate::blockchain::ChainConnector;

/// Anvil's first account; publicly known, never holds real funds.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const TEST_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// RPC method names a test can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Call,
    PendingNonce,
    GasPrice,
    EstimateGas,
    SendRaw,
    Receipt,
    ChainId,
    BlockNumber,
    Balance,
}

#[derive(Default)]
struct Script {
    stored: U256,
    failing: Vec<Method>,
    calls: Vec<Method>,
    sent: Vec<Bytes>,
    nonce: u64,
    /// Number of `None` answers before the receipt appears.
    receipt_delay: u64,
    /// Raw bytes returned from `call` instead of the encoded value.
    call_override: Option<Bytes>,
}

/// In-process node: one stored value, a nonce counter and a call log.
#[derive(Clone, Default)]
pub struct MockRpc {
    script: Arc<Mutex<Script>>,
    receipt_polls: Arc<AtomicU64>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stored(&self, value: u64) {
        self.script.lock().unwrap().stored = U256::from(value);
    }

    pub fn fail(&self, method: Method) {
        self.script.lock().unwrap().failing.push(method);
    }

    pub fn set_call_response(&self, raw: Bytes) {
        self.script.lock().unwrap().call_override = Some(raw);
    }

    pub fn set_receipt_delay(&self, polls: u64) {
        self.script.lock().unwrap().receipt_delay = polls;
    }

    pub fn calls(&self) -> Vec<Method> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn receipt_polls(&self) -> u64 {
        self.receipt_polls.load(Ordering::SeqCst)
    }

    fn enter(&self, method: Method) -> BlockchainResult<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(method);
        if script.failing.contains(&method) {
            return Err(BlockchainError::Rpc(format!("{:?} unavailable", method)));
        }
        Ok(())
    }

    /// Connector wired to this mock and the test wallet.
    pub fn connector(&self) -> Arc<ChainConnector> {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        Arc::new(ChainConnector::new(Arc::new(self.clone()), wallet))
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn call(&self, _tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.enter(Method::Call)?;
        let script = self.script.lock().unwrap();
        if let Some(raw) = &script.call_override {
            return Ok(raw.clone());
        }
        Ok(Bytes::from(script.stored.to_be_bytes::<32>().to_vec()))
    }

    async fn pending_nonce(&self, _address: Address) -> BlockchainResult<u64> {
        self.enter(Method::PendingNonce)?;
        Ok(self.script.lock().unwrap().nonce)
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.enter(Method::GasPrice)?;
        Ok(1_000_000_000)
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> BlockchainResult<u64> {
        self.enter(Method::EstimateGas)?;
        Ok(26_000)
    }

    async fn send_raw_transaction(&self, encoded: Bytes) -> BlockchainResult<TxHash> {
        self.enter(Method::SendRaw)?;
        let mut script = self.script.lock().unwrap();
        script.nonce += 1;
        let hash = keccak256(&encoded);
        script.sent.push(encoded);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        self.enter(Method::Receipt)?;
        let polls = self.receipt_polls.fetch_add(1, Ordering::SeqCst);
        if polls < self.script.lock().unwrap().receipt_delay {
            return Ok(None);
        }
        Ok(Some(Receipt {
            transaction_hash: hash,
            block_number: Some(12),
            gas_used: 26_000,
            success: true,
        }))
    }

    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.enter(Method::ChainId)?;
        Ok(1337)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.enter(Method::BlockNumber)?;
        Ok(12)
    }

    async fn balance(&self, _address: Address) -> BlockchainResult<U256> {
        self.enter(Method::Balance)?;
        Ok(U256::from(10u64).pow(U256::from(18)))
    }
}
