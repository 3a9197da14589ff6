// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelgate serve`: run the HTTP gateway until SIGINT or SIGTERM.

use modelgate_config::ModelgateConfig;
use modelgate_core::ModelgateError;
use modelgate_gateway::{start_server, GatewayState, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bootstrap::{build_runtime, LogBackend};

/// Runs the `modelgate serve` command.
pub async fn run_serve(config: ModelgateConfig) -> Result<(), ModelgateError> {
    info!("starting modelgate serve");

    let runtime = build_runtime(&config, LogBackend::Configured).await?;
    let state = GatewayState::new(runtime.pipeline, runtime.stats);
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    let cancel = install_signal_handler();
    let result = start_server(&server_config, state, async move { cancel.cancelled().await }).await;

    // The server owned the last pipeline handle, so the queue can drain now.
    let written = runtime.writer.shutdown().await;
    info!(written, "routing log flushed");
    info!("modelgate serve shutdown complete");
    result
}

/// Cancel the returned token on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise modelgate crates log at `log_level`
/// and everything else at `warn`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("modelgate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_handler_token_starts_live() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
