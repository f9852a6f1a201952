//! Value bridge library.
//!
//! Reads and writes one `uint256` held by a storage contract, mirrors every
//! observed value into an append-only PostgreSQL ledger, and reconciles the
//! two on request.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod reconcile;

pub use config::ServiceConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
