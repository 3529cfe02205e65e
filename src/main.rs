//! pricecast - short-horizon price direction forecaster
//!
//! Fetches the recent one-minute window, trains a one-step regressor on
//! indicator features and rolls it forward to each requested target time.
//!
//! # Usage
//! ```sh
//! pricecast --price 70000 --time "2026-10-16 18:30"
//! MODE=mock pricecast --price 60500 --time 2026-10-16T18:30 --time 2026-10-16T19:00 --json
//! ```
//!
//! # Environment Variables
//! - `MODE` - `binance` (default) or `mock`
//! - `FORECAST_MODEL` - `mlp` (default), `linear` or `forest`
//! - `RUST_LOG` - log filter (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use pricecast::application::ml::ModelKind;
use pricecast::config::Config;
use pricecast::domain::forecast::types::PredictionRequest;
use pricecast::infrastructure::factory::ServiceFactory;
use pricecast::interfaces::report::render_report;
use tracing::{Level, error, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target price to compare the forecast against
    #[arg(long)]
    price: String,

    /// Target time, e.g. "2026-10-16 18:30" (UTC). Repeat for several horizons.
    #[arg(long, required = true)]
    time: Vec<String>,

    /// Override FORECAST_MODEL (linear, forest, mlp)
    #[arg(long)]
    model: Option<String>,

    /// Print responses as JSON instead of a text report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so --json output stays clean
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let args = Args::parse();
    info!("pricecast {} starting...", env!("CARGO_PKG_VERSION"));

    // Validate every request before touching the network
    let requests = args
        .time
        .iter()
        .map(|time| PredictionRequest::parse(&args.price, time))
        .collect::<Result<Vec<_>, _>>()?;

    let model_override = args
        .model
        .as_deref()
        .map(str::parse::<ModelKind>)
        .transpose()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    let service = ServiceFactory::create_prediction_service(&config, model_override)?;

    let results = service.predict_all(&requests).await;

    let mut failures = 0;
    for result in results {
        match result {
            Ok(response) if args.json => println!("{}", serde_json::to_string_pretty(&response)?),
            Ok(response) => println!("{}\n", render_report(&config.binance.symbol, &response)),
            Err(e) if e.is_validation() => {
                warn!("Prediction rejected: {}", e);
                failures += 1;
            }
            Err(e) => {
                error!("Prediction failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} predictions failed", failures, requests.len());
    }
    Ok(())
}
