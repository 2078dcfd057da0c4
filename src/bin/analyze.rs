use anyhow::{Context, Result};
use clap::Parser;
use gold_sovereign::application::analyst::MarketAnalyst;
use gold_sovereign::config::AnalysisConfig;
use gold_sovereign::domain::market::bar::{Bar, PriceSeries};
use gold_sovereign::domain::market::timeframe::Timeframe;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Offline market structure analysis over OHLCV CSV files.
///
/// Reads a primary instrument plus optional auxiliary instruments, runs the
/// analysis engines, and prints the report as JSON.
#[derive(Parser, Debug)]
#[command(name = "analyze")]
struct Args {
    /// Primary instrument CSV (columns: timestamp,open,high,low,close,volume)
    #[arg(long)]
    primary: PathBuf,

    /// Symbol label for the primary instrument
    #[arg(long, default_value = "GC=F")]
    symbol: String,

    /// Auxiliary instrument as SYMBOL=path.csv (repeatable)
    #[arg(long = "aux")]
    auxiliaries: Vec<String>,

    /// Bar timeframe of the input files
    #[arg(long, default_value = "1Day")]
    timeframe: String,
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: i64,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

fn load_series(path: &Path, symbol: &str, timeframe: Timeframe) -> Result<PriceSeries> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let row: CsvBar = record.with_context(|| format!("Bad row in {}", path.display()))?;
        bars.push(Bar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    Ok(PriceSeries::new(symbol, timeframe, bars)?)
}

/// Parse "SYMBOL=path.csv" into its parts.
fn parse_aux(spec: &str) -> Result<(String, PathBuf)> {
    let (symbol, path) = spec
        .split_once('=')
        .context("auxiliary must be SYMBOL=path.csv")?;
    Ok((symbol.to_string(), PathBuf::from(path)))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AnalysisConfig::from_env()?;
    let timeframe: Timeframe = args.timeframe.parse()?;

    let primary = load_series(&args.primary, &args.symbol, timeframe)?;

    let mut auxiliaries = Vec::with_capacity(args.auxiliaries.len());
    for spec in &args.auxiliaries {
        let (symbol, path) = parse_aux(spec)?;
        auxiliaries.push(load_series(&path, &symbol, timeframe)?);
    }

    let report = MarketAnalyst::new(config).analyze(&primary, &auxiliaries)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
