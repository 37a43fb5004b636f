//! Automation helper.
//!
//! A long-lived local service that runs monitoring automations against an
//! in-memory snapshot of the site configuration, rebuilding the snapshot
//! only when a watched file has changed since it was built.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                  AUTOMATION HELPER                   │
//!                    │                                                      │
//!   POST /automation │  ┌────────┐    ┌────────────┐    ┌───────────────┐   │
//!   ─────────────────┼─▶│  http  │───▶│  dispatch  │───▶│    engine     │   │
//!                    │  │ server │    │ (timeout,  │    │ (blocking     │   │
//!   GET /health      │  └───┬────┘    │  console)  │    │  worker)      │   │
//!   ─────────────────┼─────▶│         └─────┬──────┘    └───────────────┘   │
//!                    │      │               │ ensure_fresh                  │
//!                    │      ▼               ▼                               │
//!                    │  ┌────────┐    ┌────────────┐    ┌───────────────┐   │
//!                    │  │ health │◀───│   reload   │◀───│   staleness   │◀──┼── notify
//!                    │  │reporter│    │coordinator │    │    cache      │   │  (site files)
//!                    │  └────────┘    └────────────┘    └───────────────┘   │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use automation_helper::config::validation::validate_config;
use automation_helper::config::{load_config, ConfigError, HelperConfig};
use automation_helper::http::HttpServer;
use automation_helper::lifecycle::{self, signals, Shutdown};
use automation_helper::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "automation-helper")]
#[command(about = "Local automation helper with configuration caching", long_about = None)]
struct Args {
    /// Service configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site root; overrides `site.root`.
    #[arg(long, env = "OMD_ROOT")]
    site_root: Option<PathBuf>,

    /// Listen address; overrides `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => HelperConfig::default(),
    };
    if let Some(root) = args.site_root {
        config.site.root = root;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    let log_level = logging::init_logging(&config.observability.log_level);

    tracing::info!("automation-helper v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        site_root = %config.site.root.display(),
        max_request_secs = config.timeouts.max_request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let service = lifecycle::start(&config, &shutdown, Some(log_level)).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn(signals::handle_signals(
        shutdown.clone(),
        service.coordinator.clone(),
    ));

    let server = HttpServer::new(service.app_state(), &config.listener);
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
