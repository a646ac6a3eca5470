//! Example: PCA risk sources of the German composite index
//!
//! 1. Resolve the DAX, MDAX and SDAX constituents from Wikipedia
//! 2. Download daily bars and company metadata from Yahoo Finance into SQLite
//! 3. Clean adjusted closes, compute daily returns and fit five components
//! 4. Print explained variance, sector loadings and the risk/return table
//!
//! Run with: `cargo run --example dax_pca -- [config.toml]`
//!
//! Set `RUST_LOG=debug` for per-ticker progress.

use std::{env, fs};

use pcarisk::{Pipeline, PipelineConfig, init_tracing, model::PcaConfig, primitives::PriceField};

const INDEX: &str = "DAX-COMPOSITE";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match env::args().nth(1) {
        Some(path) => PipelineConfig::from_toml_str(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    if let Some(parent) = config.database_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pipeline = Pipeline::open(config)?;

    let universe = pipeline.universe(INDEX)?;
    println!("{INDEX}: {} tickers", universe.len());

    let report = pipeline.update_prices(INDEX)?;
    println!(
        "prices: {} received, {} new, {} already stored",
        report.received,
        report.inserted,
        report.ignored()
    );

    let returns = pipeline.returns(&universe, PriceField::AdjClose, None, None)?;
    let prices = returns.prices();
    println!(
        "{} of {} tickers have enough history ({} rows)",
        prices.n_tickers(),
        universe.len(),
        prices.n_rows()
    );

    let daily = returns.daily()?;
    let loadings = pipeline.fit_pca_with(daily, PcaConfig { use_covariance: false, n_components: 5 })?;
    println!("\n{}", loadings.variance_frame()?);

    for k in 0..loadings.n_components() {
        let top: Vec<String> = loadings
            .top_contributors(k, 3)
            .into_iter()
            .map(|(ticker, w)| format!("{ticker} ({w:+.3})"))
            .collect();
        println!("{}: {}", loadings.components()[k], top.join(", "));
    }

    let sector = pipeline.sector_loadings(&loadings)?;
    println!("\n{}", sector.to_frame()?);

    let monthly = returns.monthly()?;
    let table = pipeline.risk_return_table(&monthly)?;
    println!("\n{}", table.to_frame()?);

    Ok(())
}
