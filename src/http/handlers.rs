//! Route handlers.
//!
//! Each handler reads on-chain truth through the connector or engine, then
//! wraps the result in the [`ApiResponse`] envelope.

use alloy::primitives::{TxHash, U256};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::{contract, Receipt};
use crate::http::response::{ApiError, ApiResponse, ApiResult};
use crate::http::server::AppState;
use crate::http::status::{ContractStatus, DatabaseStatus, HealthReport, StatusSnapshot};
use crate::ledger::{LedgerRecord, PageRequest};
use crate::reconcile::{CheckReport, SetOutcome, SyncReport};

/// A stored value as sent by clients: a JSON number or a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueInput {
    Number(u64),
    Text(String),
}

impl ValueInput {
    fn to_u256(&self) -> Result<U256, ApiError> {
        match self {
            ValueInput::Number(n) => Ok(U256::from(*n)),
            ValueInput::Text(raw) => contract::parse_stored_value(raw)
                .map_err(|e| ApiError::bad_request(format!("Invalid value: {}", e))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetValueRequest {
    pub value: ValueInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetValueData {
    pub value: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetValueData {
    pub value: String,
    pub source: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryData {
    pub history: Vec<LedgerRecord>,
    pub pagination: PageRequest,
}

/// `GET /`
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "value-bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "set": "POST /api/set - Set new value in smart contract",
            "get": "GET /api/get - Get current value from blockchain",
            "sync": "POST /api/sync - Sync blockchain value to database",
            "check": "GET /api/check - Compare database vs blockchain values",
            "history": "GET /api/history - Get value change history",
            "status": "GET /api/status - Get system status",
            "health": "GET /api/health - Probe node and database",
            "receipt": "GET /api/receipt/{tx_hash} - Wait for a transaction receipt",
        },
    }))
}

/// `POST /api/set`
pub async fn set_value(
    State(state): State<AppState>,
    payload: Result<Json<SetValueRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;
    let value = request.value.to_u256()?;

    let outcome = state
        .engine
        .set_and_record(value)
        .await
        .map_err(|e| ApiError::reconcile("Failed to set value on blockchain", e))?;

    let response = match outcome {
        SetOutcome::Recorded { value, tx_hash } => {
            tracing::info!(tx_hash = %tx_hash, value = %value, "Value set");
            ApiResponse::ok(SetValueData { value, tx_hash })
                .with_message("Value set successfully")
                .into_response()
        }
        SetOutcome::Unrecorded {
            value,
            tx_hash,
            error,
        } => (
            StatusCode::PARTIAL_CONTENT,
            ApiResponse::failed_with(
                SetValueData { value, tx_hash },
                format!(
                    "Value set on blockchain but failed to store in database: {}",
                    error
                ),
            ),
        )
            .into_response(),
    };
    Ok(response)
}

/// `GET /api/get`
pub async fn get_value(State(state): State<AppState>) -> ApiResult<GetValueData> {
    let value = state
        .engine
        .current_value()
        .await
        .map_err(|e| ApiError::reconcile("Failed to get value from blockchain", e))?;

    Ok(ApiResponse::ok(GetValueData {
        value: value.to_string(),
        source: "blockchain",
        timestamp: Utc::now(),
    }))
}

/// `POST /api/sync`
pub async fn sync_value(State(state): State<AppState>) -> ApiResult<SyncReport> {
    let report = state
        .engine
        .sync()
        .await
        .map_err(|e| ApiError::reconcile("Failed to sync value", e))?;

    let message = format!("Sync completed. Updated: {}", report.updated);
    Ok(ApiResponse::ok(report).with_message(message))
}

/// `GET /api/check`
pub async fn check_value(State(state): State<AppState>) -> ApiResult<CheckReport> {
    let report = state
        .engine
        .check()
        .await
        .map_err(|e| ApiError::reconcile("Failed to compare values", e))?;
    Ok(ApiResponse::ok(report))
}

/// `GET /api/history?limit&offset`
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryData> {
    let page = PageRequest::normalize(query.limit.as_deref(), query.offset.as_deref());
    let history = state.ledger.history(page).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get history from database: {}", e),
        )
    })?;

    Ok(ApiResponse::ok(HistoryData {
        history,
        pagination: page,
    }))
}

/// `GET /api/status`
///
/// A node failure fails the request; a ledger failure is reported inside
/// the snapshot.
pub async fn status(State(state): State<AppState>) -> ApiResult<StatusSnapshot> {
    let network = state
        .connector
        .network_info()
        .await
        .map_err(|e| ApiError::chain("Failed to get network info", e))?;

    let database = DatabaseStatus::probe(state.ledger.as_ref()).await;

    Ok(ApiResponse::ok(StatusSnapshot {
        timestamp: Utc::now(),
        network,
        database,
        contract: ContractStatus::from_address(state.engine.contract_address()),
    }))
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Response {
    let report = HealthReport::probe(
        &state.connector,
        state.ledger.as_ref(),
        state.engine.contract_address(),
    )
    .await;

    if report.is_healthy() {
        ApiResponse::ok(report).into_response()
    } else {
        tracing::warn!(
            node = report.node.status,
            database = report.database.status,
            "Health check degraded"
        );
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiResponse::failed_with(report, "Service degraded"),
        )
            .into_response()
    }
}

/// `GET /api/receipt/{tx_hash}`
pub async fn receipt(
    State(state): State<AppState>,
    Path(raw_hash): Path<String>,
) -> ApiResult<Receipt> {
    let tx_hash: TxHash = raw_hash
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid transaction hash '{}': {}", raw_hash, e)))?;

    let chain = &state.config.blockchain;
    let poll_interval = Duration::from_millis(chain.receipt_poll_interval_ms);
    let deadline = Duration::from_secs(chain.receipt_timeout_secs);

    let receipt = tokio::time::timeout(
        deadline,
        state.submitter.wait_for_receipt(tx_hash, poll_interval),
    )
    .await
    .map_err(|_| {
        ApiError::new(
            StatusCode::GATEWAY_TIMEOUT,
            format!(
                "Timed out waiting for receipt of {} after {} seconds",
                tx_hash, chain.receipt_timeout_secs
            ),
        )
    })?
    .map_err(|e| ApiError::chain("Failed to get transaction receipt", e))?;

    Ok(ApiResponse::ok(receipt))
}
