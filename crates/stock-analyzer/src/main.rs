//! stock-analyzer: interactive price lookup with moving average, RSI and MACD.
//!
//! Asks for a ticker and a period (or an explicit date range), fetches daily
//! bars from Polygon, prints summary statistics, exports a CSV and saves a
//! three-panel chart.
//!
//! Usage:
//!   POLYGON_API_KEY=... cargo run -p stock-analyzer
//!   RUST_LOG=stock_analyzer=debug cargo run -p stock-analyzer

mod chart;
mod config;
mod export;
mod prompt;
mod report;
mod session;

use anyhow::{Context, Result};
use polygon_client::PolygonClient;
use std::io;
use std::time::Duration;

use config::AnalyzerConfig;
use prompt::Prompter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stock_analyzer=info,polygon_client=warn".into());
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    let config = AnalyzerConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        "indicators: MA({}) RSI({}) MACD({}/{}/{}), output dir {}",
        config.indicators.ma_window,
        config.indicators.rsi_window,
        config.indicators.macd.short,
        config.indicators.macd.long,
        config.indicators.macd.signal,
        config.output_dir.display()
    );

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create output dir {}", config.output_dir.display()))?;

    let polygon = PolygonClient::with_timeout(
        config.polygon_api_key.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )
    .with_base_url(config.polygon_base_url.clone());

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let outcome = session::run(&polygon, &config, &mut prompter).await?;

    tracing::info!(
        "done: {} bars, csv={:?}, chart={:?}",
        outcome.bars,
        outcome.csv,
        outcome.chart
    );
    Ok(())
}
