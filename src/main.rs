//! Value bridge service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum) ──┬──▶ ReconciliationEngine ──┬──▶ ValueLedger (PostgreSQL)
//!                                   │                          │
//!                                   ├──▶ TxSubmitter ──────────┤
//!                                   │                          ▼
//!                                   └──▶ ChainConnector ──▶ ChainRpc (alloy) ──▶ Node
//!
//!     Cross-cutting: config, observability (tracing, metrics), lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use value_bridge::blockchain::{BlockchainClient, ChainConnector, Wallet};
use value_bridge::config::load_config;
use value_bridge::ledger::PgLedger;
use value_bridge::lifecycle::{signals, Shutdown};
use value_bridge::observability::{logging, metrics};
use value_bridge::{AppState, HttpServer};

#[derive(Parser)]
#[command(name = "value-bridge")]
#[command(about = "Contract value service with a PostgreSQL ledger", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("value-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.blockchain.rpc_url,
        chain_id = config.blockchain.chain_id,
        contract_configured = !config.blockchain.contract_address.is_empty(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let wallet = Wallet::from_env()?;
    let client = BlockchainClient::new(config.blockchain.clone())?;
    match client.verify_chain_id().await {
        Ok(chain_id) => tracing::info!(chain_id = chain_id.0, "Connected to node"),
        Err(e) => tracing::warn!(error = %e, "Could not verify chain ID"),
    }
    let connector = Arc::new(ChainConnector::new(Arc::new(client), wallet));
    tracing::info!(account = %connector.address(), "Signer loaded");

    let ledger = PgLedger::connect(&config.database).await?;
    ledger.migrate().await?;

    if config.blockchain.contract_address.is_empty() {
        tracing::warn!("CONTRACT_ADDRESS not set; value endpoints will return 412");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let _signals = signals::spawn_signal_handler(shutdown.clone());

    let state = AppState::new(connector.clone(), Arc::new(ledger.clone()), config);
    HttpServer::new(state).run(listener, shutdown.subscribe()).await?;

    connector.close();
    ledger.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
