//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout, CORS)
//!     → handlers.rs (connector / submitter / engine / ledger)
//!     → response.rs (envelope, error → status)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;
pub mod status;

pub use response::{ApiError, ApiResponse};
pub use server::{AppState, HttpServer};
