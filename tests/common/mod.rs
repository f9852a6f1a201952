//! Shared utilities for integration testing.
//!
//! `FakeNode` is a minimal JSON-RPC node serving the storage contract: it
//! decodes signed `set` transactions, updates its stored value, and mines
//! them immediately unless receipts are held back.

#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{hex, Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use value_bridge::blockchain::contract::ISimpleStorage;
use value_bridge::blockchain::Wallet;
use value_bridge::ledger::InMemoryLedger;
use value_bridge::{AppState, HttpServer, ServiceConfig, Shutdown};

/// Anvil's first account; publicly known, never holds real funds.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const TEST_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

pub const CHAIN_ID: u64 = 1337;

#[derive(Default)]
struct NodeState {
    stored: U256,
    nonce: u64,
    block: u64,
    receipts: HashMap<TxHash, Value>,
    hold_receipts: bool,
    methods: Vec<String>,
}

/// Handle to a running fake node.
#[derive(Clone)]
pub struct FakeNode {
    state: Arc<Mutex<NodeState>>,
    pub addr: SocketAddr,
}

impl FakeNode {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(NodeState {
            block: 1,
            ..NodeState::default()
        }));

        let app = Router::new()
            .route("/", post(handle_rpc))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, addr }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Change the stored value out of band, as another writer would.
    pub fn set_stored(&self, value: u64) {
        self.state.lock().unwrap().stored = U256::from(value);
    }

    pub fn stored(&self) -> U256 {
        self.state.lock().unwrap().stored
    }

    pub fn nonce(&self) -> u64 {
        self.state.lock().unwrap().nonce
    }

    /// Leave submitted transactions unmined.
    pub fn hold_receipts(&self) {
        self.state.lock().unwrap().hold_receipts = true;
    }

    pub fn methods(&self) -> Vec<String> {
        self.state.lock().unwrap().methods.clone()
    }
}

async fn handle_rpc(
    State(state): State<Arc<Mutex<NodeState>>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    match body {
        Value::Array(batch) => Json(Value::Array(
            batch.iter().map(|req| dispatch(&state, req)).collect(),
        )),
        single => Json(dispatch(&state, &single)),
    }
}

fn quantity(n: impl Into<u128>) -> Value {
    Value::String(format!("0x{:x}", n.into()))
}

fn dispatch(state: &Mutex<NodeState>, request: &Value) -> Value {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = &request["params"];
    let mut node = state.lock().unwrap();
    node.methods.push(method.clone());

    let result = match method.as_str() {
        "eth_chainId" => Ok(quantity(CHAIN_ID)),
        "eth_blockNumber" => Ok(quantity(node.block)),
        "eth_getBalance" => Ok(quantity(1_000_000_000_000_000_000u128)),
        "eth_gasPrice" => Ok(quantity(1_000_000_000u64)),
        "eth_estimateGas" => Ok(quantity(26_000u64)),
        "eth_getTransactionCount" => Ok(quantity(node.nonce)),
        "eth_call" => {
            let input = params[0]["input"]
                .as_str()
                .or_else(|| params[0]["data"].as_str())
                .unwrap_or_default();
            let selector = format!("0x{}", hex::encode(ISimpleStorage::getCall::SELECTOR));
            if input.starts_with(&selector) {
                Ok(Value::String(format!(
                    "0x{}",
                    hex::encode(node.stored.to_be_bytes::<32>())
                )))
            } else {
                Err("execution reverted")
            }
        }
        "eth_sendRawTransaction" => match params[0].as_str().map(send_raw) {
            Some(Ok((hash, value, to))) => {
                node.stored = value;
                node.nonce += 1;
                node.block += 1;
                if !node.hold_receipts {
                    let receipt = receipt_json(hash, node.block, to);
                    node.receipts.insert(hash, receipt);
                }
                Ok(Value::String(hash.to_string()))
            }
            _ => Err("invalid raw transaction"),
        },
        "eth_getTransactionReceipt" => {
            let receipt = params[0]
                .as_str()
                .and_then(|h| h.parse::<TxHash>().ok())
                .and_then(|h| node.receipts.get(&h).cloned());
            Ok(receipt.unwrap_or(Value::Null))
        }
        _ => Err("method not found"),
    };

    match result {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32000, "message": message},
        }),
    }
}

fn send_raw(raw: &str) -> Result<(TxHash, U256, Address), String> {
    let bytes: Bytes = raw.parse().map_err(|e| format!("{e}"))?;
    let envelope = TxEnvelope::decode_2718(&mut bytes.as_ref()).map_err(|e| format!("{e}"))?;
    let call = ISimpleStorage::setCall::abi_decode(envelope.input()).map_err(|e| format!("{e}"))?;
    let to = envelope.to().ok_or("missing recipient")?;
    Ok((*envelope.tx_hash(), call._value, to))
}

fn receipt_json(hash: TxHash, block: u64, to: Address) -> Value {
    json!({
        "type": "0x0",
        "transactionHash": hash.to_string(),
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": quantity(block),
        "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        "to": to.to_string(),
        "cumulativeGasUsed": quantity(26_000u64),
        "gasUsed": quantity(26_000u64),
        "effectiveGasPrice": quantity(1_000_000_000u64),
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "status": "0x1",
    })
}

/// A running value service wired to a fake node and an in-memory ledger.
pub struct TestService {
    pub base_url: String,
    pub node: FakeNode,
    pub ledger: InMemoryLedger,
    shutdown: Shutdown,
}

impl TestService {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(tweak: impl FnOnce(&mut ServiceConfig)) -> Self {
        let node = FakeNode::start().await;

        let mut config = ServiceConfig::default();
        config.blockchain.rpc_url = node.url();
        config.blockchain.chain_id = CHAIN_ID;
        config.blockchain.contract_address = TEST_CONTRACT.to_string();
        config.blockchain.receipt_poll_interval_ms = 20;
        config.blockchain.receipt_timeout_secs = 2;
        tweak(&mut config);

        let client = value_bridge::blockchain::BlockchainClient::new(config.blockchain.clone())
            .unwrap();
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let connector = Arc::new(value_bridge::blockchain::ChainConnector::new(
            Arc::new(client),
            wallet,
        ));

        let ledger = InMemoryLedger::new();
        let state = AppState::new(connector, Arc::new(ledger.clone()), config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            HttpServer::new(state).run(listener, rx).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            node,
            ledger,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}
