//! scrape-n: single-endpoint scraping service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                   SCRAPE SERVICE                  │
//!                        │                                                   │
//!   POST /scrape         │  ┌─────────┐    ┌────────────┐    ┌───────────┐  │
//!   ─────────────────────┼─▶│  http   │───▶│ supervisor │───▶│ executor  │  │
//!                        │  │ server  │    │ (deadline, │    │(validate, │  │
//!                        │  └─────────┘    │ disconnect)│    │ dispatch) │  │
//!                        │                 └────────────┘    └─────┬─────┘  │
//!                        │                                 ┌───────┴──────┐ │
//!                        │                                 ▼              ▼ │
//!                        │                           ┌──────────┐ ┌────────┐│
//!   200 / 500 / 408      │                           │  static  │ │rendered││──▶ proxy ──▶ site
//!   ◀────────────────────┼───────────────────────────│ (reqwest)│ │(Chrome)││
//!                        │                           └──────────┘ └────────┘│
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use scrape_n::config::{apply_overrides, load_config, ScraperConfig};
use scrape_n::lifecycle::{signals, startup, Shutdown};
use scrape_n::observability::logging;

#[derive(Parser)]
#[command(name = "scrape-n", version, about = "Single-endpoint scraping service")]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScraperConfig::default(),
    };
    let config = apply_overrides(config, cli.bind)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "scrape-n starting");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    startup::serve(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
