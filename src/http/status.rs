//! System status and health reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::blockchain::{ChainConnector, NetworkInfo};
use crate::ledger::ValueLedger;

/// Ledger view inside a [`StatusSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    /// `connected` or `error`.
    pub status: &'static str,
    pub latest_value: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DatabaseStatus {
    /// Probe the ledger. A failure is reported, not propagated.
    pub async fn probe(ledger: &dyn ValueLedger) -> Self {
        match ledger.latest().await {
            Ok(latest) => Self {
                status: "connected",
                latest_value: latest.as_ref().map(|r| r.value.clone()),
                last_updated: latest.map(|r| r.observed_at),
                error: None,
            },
            Err(e) => Self {
                status: "error",
                latest_value: None,
                last_updated: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Contract configuration view.
#[derive(Debug, Clone, Serialize)]
pub struct ContractStatus {
    /// `configured` or `not_configured`.
    pub status: &'static str,
    pub address: String,
}

impl ContractStatus {
    pub fn from_address(address: &str) -> Self {
        let status = if address.is_empty() {
            "not_configured"
        } else {
            "configured"
        };
        Self {
            status,
            address: address.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.status == "configured"
    }
}

/// Response body of `GET /api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    pub network: NetworkInfo,
    pub database: DatabaseStatus,
    pub contract: ContractStatus,
}

/// One probed dependency.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// `ok` or `error`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: "ok",
            detail: Some(detail.into()),
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            status: "error",
            detail: Some(detail.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Response body of `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// `ok` or `degraded`.
    pub status: &'static str,
    pub node: ComponentHealth,
    pub database: ComponentHealth,
    pub contract: ContractStatus,
}

impl HealthReport {
    /// Probe node and ledger. An unconfigured contract does not degrade
    /// the service.
    pub async fn probe(
        connector: &ChainConnector,
        ledger: &dyn ValueLedger,
        contract_address: &str,
    ) -> Self {
        let (node, database) = tokio::join!(connector.rpc().block_number(), ledger.ping());

        let node = match node {
            Ok(block) => ComponentHealth::ok(format!("block {}", block)),
            Err(e) => ComponentHealth::error(e.to_string()),
        };
        let database = match database {
            Ok(now) => ComponentHealth::ok(format!("clock {}", now.to_rfc3339())),
            Err(e) => ComponentHealth::error(e.to_string()),
        };

        let status = if node.is_ok() && database.is_ok() {
            "ok"
        } else {
            "degraded"
        };

        Self {
            status,
            node,
            database,
            contract: ContractStatus::from_address(contract_address),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}
