//! quoteguard command line.
//!
//! Read-only venue queries for the configured pair, and maker-mode filtering
//! of an operation batch read from a JSON file.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qg_core::Asset;
use qg_telemetry::Metrics;
use serde::Serialize;
use tracing::info;

/// Maker-only order safety filter and signed venue gateway
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via QG_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show both sides of the order book
    Book {
        /// Levels per side (defaults to filter.book_depth)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Show best bid and ask
    Ticker,
    /// Show account balances (defaults to the pair's assets)
    Balances { assets: Vec<String> },
    /// List open orders for the pair
    OpenOrders,
    /// Run an operation batch through the submit filter
    Filter {
        /// JSON file with `ops`, `selling_offers` and `buying_offers`
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    qg_telemetry::init_logging()?;

    info!("Starting quoteguard v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > QG_CONFIG env var > config/default.toml
    let config = qg_bot::AppConfig::load(args.config)?;
    info!(
        venue = %config.venue.kind,
        pair = %config.filter.pair,
        simulated = config.venue.simulated,
        "Configuration loaded"
    );

    let app = qg_bot::Application::new(config)?;

    match args.command {
        Command::Book { depth } => print_json(&app.order_book(depth).await?)?,
        Command::Ticker => print_json(&app.ticker().await?)?,
        Command::Balances { assets } => {
            let assets: Vec<Asset> = assets.iter().map(|a| Asset::new(a.as_str())).collect();
            print_json(&app.balances(&assets).await?)?
        }
        Command::OpenOrders => print_json(&app.open_orders().await?)?,
        Command::Filter { input } => {
            let batch = qg_bot::FilterBatch::from_file(&input)?;
            print_json(&app.filter(batch).await?)?
        }
    }

    if args.metrics {
        eprintln!("{}", Metrics::gather_text()?);
    }

    Ok(())
}
