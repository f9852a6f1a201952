//! Response envelope and error mapping.
//!
//! Every `/api` response is `{success, data?, error?, message?}`.
//!
//! # Status mapping
//! - contract not configured → 412
//! - malformed input, encoding failures → 400
//! - node timeouts → 504
//! - other node failures → 502
//! - ledger failures → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::BlockchainError;
use crate::reconcile::ReconcileError;

/// The JSON envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// A failure that still carries data, e.g. a partial write.
    pub fn failed_with(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
            message: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// An error rendered as a `success: false` envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Map a chain error, prefixing the message with what was attempted.
    pub fn chain(context: &str, err: BlockchainError) -> Self {
        Self::new(chain_status(&err), format!("{}: {}", context, err))
    }

    /// Map an engine error, prefixing the message with what was attempted.
    pub fn reconcile(context: &str, err: ReconcileError) -> Self {
        match err {
            ReconcileError::Chain(e) => Self::chain(context, e),
            ReconcileError::Ledger(e) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", context, e),
            ),
        }
    }
}

/// HTTP status for a chain error.
pub fn chain_status(err: &BlockchainError) -> StatusCode {
    match err {
        BlockchainError::Config(_) => StatusCode::PRECONDITION_FAILED,
        BlockchainError::Encoding(_) => StatusCode::BAD_REQUEST,
        BlockchainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.error),
            message: None,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
