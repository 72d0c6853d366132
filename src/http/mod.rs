//! HTTP boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware layers)
//!     → request.rs (request id, span)
//!     → handlers.rs
//!         /fetch           → FetchGateway → DocumentTransformer → JSON
//!         /proxy-resource  → FetchGateway → (CSS: ColorRewriter) → bytes
//!     → error.rs (failures as {"error": ...})
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
