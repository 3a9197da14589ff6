// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modelgate - a cost-aware LLM router and OpenAI-compatible proxy.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod bootstrap;
mod route;
mod serve;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modelgate_config::ModelgateConfig;

/// Modelgate - a cost-aware LLM router and OpenAI-compatible proxy.
#[derive(Parser, Debug)]
#[command(name = "modelgate", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Show the routing decision for a prompt without calling any vendor.
    Route {
        /// Prompt text, treated as the last user message.
        text: String,
        /// Routing-table mode (defaults to gateway.default_mode).
        #[arg(long)]
        mode: Option<String>,
        /// Force alias, as with the x-modelgate-force header.
        #[arg(long)]
        force: Option<String>,
        /// System prompt to classify alongside the text.
        #[arg(long)]
        system: Option<String>,
    },
    /// Summarize spend and savings from the routing log.
    Stats {
        /// Lookback window in hours (defaults to log.stats_window_hours).
        #[arg(long)]
        hours: Option<u64>,
    },
}

fn load_config(path: Option<&std::path::Path>) -> ModelgateConfig {
    let result = match path {
        Some(path) => modelgate_config::load_and_validate_path(path),
        None => modelgate_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            modelgate_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    serve::init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Route {
            text,
            mode,
            force,
            system,
        }) => {
            route::run_route(
                config,
                route::RouteOptions {
                    text,
                    system,
                    mode,
                    force,
                },
            )
            .await
        }
        Some(Commands::Stats { hours }) => stats::run_stats(config, hours).await,
        None => {
            println!("modelgate: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
