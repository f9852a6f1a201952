//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, CORS, panic guard)
//! - Record per-request metrics
//! - Bind server to listener and drain on shutdown

use axum::{
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::blockchain::{ChainConnector, TxSubmitter};
use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::response::ApiError;
use crate::ledger::ValueLedger;
use crate::observability::metrics;
use crate::reconcile::ReconciliationEngine;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReconciliationEngine>,
    pub connector: Arc<ChainConnector>,
    pub submitter: Arc<TxSubmitter>,
    pub ledger: Arc<dyn ValueLedger>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Wire the submitter and engine around one connector and ledger.
    pub fn new(
        connector: Arc<ChainConnector>,
        ledger: Arc<dyn ValueLedger>,
        config: ServiceConfig,
    ) -> Self {
        let submitter = Arc::new(TxSubmitter::new(connector.clone()));
        let engine = Arc::new(ReconciliationEngine::new(
            connector.clone(),
            submitter.clone(),
            ledger.clone(),
            config.blockchain.contract_address.clone(),
        ));

        Self {
            engine,
            connector,
            submitter,
            ledger,
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the value service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around prepared state.
    pub fn new(state: AppState) -> Self {
        let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let router = Self::build_router(state, request_timeout);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        let cors_layer = CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(cors::Any);

        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        });

        Router::new()
            .route("/", get(handlers::root))
            .route("/api/set", post(handlers::set_value))
            .route("/api/get", get(handlers::get_value))
            .route("/api/sync", post(handlers::sync_value))
            .route("/api/check", get(handlers::check_value))
            .route("/api/history", get(handlers::history))
            .route("/api/status", get(handlers::status))
            .route("/api/health", get(handlers::health))
            .route("/api/receipt/{tx_hash}", get(handlers::receipt))
            .with_state(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(trace)
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(handle_panic))
                    .layer(cors_layer)
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// Router with all layers applied, for in-process callers.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        ApiError::new(StatusCode::GATEWAY_TIMEOUT, "Request timed out").into_response()
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
