use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "value-cli")]
#[command(about = "Client for the value-bridge HTTP API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the current on-chain value
    Get,
    /// Write a new value on-chain and record it
    Set {
        /// Non-negative integer, decimal
        value: String,
    },
    /// Append the on-chain value to the ledger if it drifted
    Sync,
    /// Compare ledger and chain without writing
    Check,
    /// Page through the ledger, newest first
    History {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(short, long)]
        offset: Option<u32>,
    },
    /// Node, ledger and contract status
    Status,
    /// Probe dependencies
    Health,
    /// Wait for a transaction receipt
    Receipt { tx_hash: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Get => client.get(format!("{}/api/get", base)).send().await?,
        Commands::Set { value } => {
            client
                .post(format!("{}/api/set", base))
                .json(&json!({ "value": value }))
                .send()
                .await?
        }
        Commands::Sync => client.post(format!("{}/api/sync", base)).send().await?,
        Commands::Check => client.get(format!("{}/api/check", base)).send().await?,
        Commands::History { limit, offset } => {
            let mut query = Vec::new();
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            if let Some(offset) = offset {
                query.push(("offset", offset.to_string()));
            }
            client
                .get(format!("{}/api/history", base))
                .query(&query)
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{}/api/status", base)).send().await?,
        Commands::Health => client.get(format!("{}/api/health", base)).send().await?,
        Commands::Receipt { tx_hash } => {
            client
                .get(format!("{}/api/receipt/{}", base, tx_hash))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }
    Ok(())
}
