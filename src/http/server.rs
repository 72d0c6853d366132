//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request id, tracing, timeout, body limit)
//! - Own the shared outbound client and compiled rewriters
//! - Serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RestyleConfig;
use crate::fetch::{FetchError, FetchGateway};
use crate::http::handlers;
use crate::http::request::{make_span, UuidRequestId};
use crate::lifecycle::shutdown::wait_for_signal;
use crate::rewrite::{ColorRewriter, DocumentTransformer};

/// Failure to assemble the server's shared state.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to compile color matcher: {0}")]
    Colors(#[from] regex::Error),
}

/// Application state injected into handlers.
///
/// Holds only immutable, shareable pieces; each request builds its own
/// document state inside [`DocumentTransformer::transform`].
#[derive(Clone)]
pub struct AppState {
    pub gateway: FetchGateway,
    pub transformer: Arc<DocumentTransformer>,
    pub colors: Arc<ColorRewriter>,
}

impl AppState {
    pub fn from_config(config: &RestyleConfig) -> Result<Self, ServerError> {
        let transformer = config.rewrite.transformer()?;
        Ok(Self {
            gateway: FetchGateway::new(&config.fetch)?,
            colors: Arc::new(transformer.colors().clone()),
            transformer: Arc::new(transformer),
        })
    }
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: RestyleConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RestyleConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RestyleConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/health", get(handlers::health))
            .route("/fetch", post(handlers::fetch_page))
            .route("/proxy-resource", get(handlers::proxy_resource))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The configured router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            source_color = %self.config.rewrite.source_color,
            replacement_color = %self.config.rewrite.replacement_color,
            text_rules = self.config.rewrite.text_rules.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RestyleConfig {
        &self.config
    }
}
