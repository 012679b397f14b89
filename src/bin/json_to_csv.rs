use anyhow::Result;
use clap::Parser;
use materials_analyzer::config::Config;
use materials_analyzer::report::CsvReporter;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "json-to-csv")]
#[command(about = "Materials dump to CSV report converter")]
struct Cli {
    /// Materials dump from database
    #[arg(long)]
    json: PathBuf,

    /// Output CSV file
    #[arg(long)]
    csv: PathBuf,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::from_env()
        }),
    };
    config.validate()?;

    info!("📄 JSON file: {}", cli.json.display());
    info!("📊 CSV file: {}", cli.csv.display());

    let reporter = CsvReporter::from_config(&config.report);

    let start_time = std::time::Instant::now();
    let stats = reporter.write_report(&cli.json, &cli.csv).await?;
    let duration = start_time.elapsed();

    info!(
        "🎉 Exported {} rows x {} columns in {:.2}s",
        stats.rows,
        stats.columns,
        duration.as_secs_f64()
    );

    Ok(())
}
