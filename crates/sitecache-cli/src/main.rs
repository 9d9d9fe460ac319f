//! Sitecache operator console.
//!
//! Runs connectivity, feature and performance diagnostics against the site
//! management backend using the same data layer as the dashboard.

mod cli;
mod format;
mod report;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use sitecache_core::perf::{FilePerfStore, MemoryPerfStore, PerfStore};
use sitecache_core::{ApiClient, BatchRequest, Config, DataLayer, ProbeError};

// ============================================================================
// Constants
// ============================================================================

/// The slow endpoint isolated on its own channel by `stock`
const STOCK_PATH: &str = "/api/stocks";

/// Routes fetched alongside the stock listing on the stock dashboard
const STOCK_DASHBOARD_PATHS: &[&str] = &["/api/projects", "/api/vendors", "/api/sites"];

/// Log file name inside the configured log directory
const LOG_FILE: &str = "sitecache.log";

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must outlive the program.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config() -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config, using defaults: {}", e);
            Config::default()
        }
    };
    config.apply_env();
    config
}

fn perf_store(config: &Config) -> Arc<dyn PerfStore> {
    let store = config.perf_dir().and_then(FilePerfStore::new);
    match store {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Performance logs will not persist");
            Arc::new(MemoryPerfStore::new())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let value: Value = serde_json::to_value(value)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Exits with status 2 on usage errors
    let args = Cli::parse();

    let config = load_config();
    let _guard = init_tracing(&config);
    info!(base_url = %config.base_url, "Sitecache starting");

    let api = ApiClient::with_timeout(&config.base_url, config.request_timeout())?;
    if let Some(ref token) = config.api_token {
        api.set_token(token.clone());
    }
    let layer = DataLayer::new(Arc::new(api), &config, perf_store(&config));

    match args.command {
        Command::Probe => {
            let summary = layer.prober().probe_all().await;
            if args.json {
                print_json(&summary)?;
            } else {
                print!("{}", report::render_connectivity(&summary));
            }
        }
        Command::Check { feature } => match layer.prober().probe_one(&feature).await {
            Ok(check) => {
                if args.json {
                    print_json(&check)?;
                } else {
                    print!("{}", report::render_feature(&check));
                }
            }
            Err(ProbeError::UnknownFeature(name)) => {
                eprintln!(
                    "Unknown feature '{}'. Known features: {}",
                    name,
                    sitecache_core::probe::known_features().join(", ")
                );
                return Ok(ExitCode::from(2));
            }
        },
        Command::Stock => {
            let secondary: Vec<BatchRequest> =
                STOCK_DASHBOARD_PATHS.iter().map(|p| BatchRequest::from(*p)).collect();
            let results = layer
                .batch()
                .fetch_primary_and_secondary(&BatchRequest::from(STOCK_PATH), &secondary)
                .await;
            if args.json {
                print_json(&results)?;
            } else {
                print!("{}", report::render_dashboard(&results));
            }
        }
        Command::Perf { clear } => {
            if clear {
                layer.monitor().clear();
                println!("Performance logs cleared.");
            } else if args.json {
                print_json(&layer.monitor().get_summary())?;
            } else {
                print!("{}", report::render_perf(&layer.monitor().get_summary()));
            }
        }
        Command::Audit => {
            let summary = layer.prober().probe_all().await;
            let audit = layer.auditor().report();
            if args.json {
                print_json(&serde_json::json!({ "connectivity": summary, "audit": audit }))?;
            } else {
                print!("{}", report::render_connectivity(&summary));
                println!();
                print!("{}", report::render_audit(&audit));
            }
        }
    }

    info!("Sitecache done");
    Ok(ExitCode::SUCCESS)
}
