// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use modelgate_core::ModelgateError;
use modelgate_router::ModelSpec;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::pipeline::Pipeline;

/// Settings for `GET /v1/stats`.
#[derive(Debug, Clone, Default)]
pub struct StatsSettings {
    /// Default lookback window in hours.
    pub window_hours: u64,
    /// Model the savings are computed against.
    pub baseline: Option<ModelSpec>,
}

/// Shared state for axum request handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub stats: StatsSettings,
    /// Process start time for uptime.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(pipeline: Arc<Pipeline>, stats: StatsSettings) -> Self {
        Self {
            pipeline,
            stats,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the route table:
/// - POST /v1/chat/completions
/// - GET /v1/stats
/// - GET /health
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/chat/completions", post(handlers::post_chat_completions))
        .route("/v1/stats", get(handlers::get_stats))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ModelgateError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ModelgateError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ModelgateError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8787,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8787"));
    }
}
