//! Host Inspector — host diagnostics tool server
//!
//! Serves seven read-only diagnostic tools over HTTP on port 8000:
//!   - monitor: system metrics, log file error scan
//!   - process: process lookup by name, busiest running processes
//!   - net: outbound connectivity, local port status
//!   - system: static host identity

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod executor;
mod registry;
mod schema;
mod server;
mod time;

mod monitor;
mod net;
mod process;
mod system;

use config::{InspectorConfig, LoggingConfig};
use registry::Registry;
use server::ToolServerState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config_logged(&config::config_path(), std::io::stderr)?;
    init_tracing(&config.logging);

    info!("Host Inspector v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut registry = Registry::new();
    register_builtin_tools(&mut registry, &config);

    let executor = executor::Executor::new(&config);
    for tool in registry.list_tools("") {
        if !executor.has_handler(&tool.name) {
            warn!("Dropping tool without handler: {}", tool.name);
            registry.deregister_tool(&tool.name);
        }
    }

    let state = Arc::new(ToolServerState { registry, executor });

    server::serve(state, &config.server.bind_address, shutdown_signal())
        .await
        .context("Tool server failed")?;

    info!("Host Inspector shut down cleanly");
    Ok(())
}

/// Load the config file under a bootstrap subscriber. The real subscriber
/// depends on the config, so loader warnings would otherwise be lost.
fn load_config_logged<W>(path: &Path, make_writer: W) -> Result<InspectorConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(make_writer)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::with_default(bootstrap, || config::load_config_from(path))
}

/// `RUST_LOG` takes precedence over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .compact()
            .init();
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down..."),
            Err(e) => error!("Failed to listen for SIGINT: {e}"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Register all built-in diagnostic tools
pub fn register_builtin_tools(reg: &mut Registry, config: &InspectorConfig) {
    // Monitor tools
    monitor::register_tools(reg, &config.metrics, &config.logs);
    // Process tools
    process::register_tools(reg);
    // Network tools
    net::register_tools(reg, &config.probes);
    // System tools
    system::register_tools(reg);

    info!("Registered {} built-in tools", reg.tool_count());
}
