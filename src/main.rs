use anyhow::Result;
use clap::{Arg, Command};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use materials_analyzer::config::Config;
use materials_analyzer::enrich::MaterialEnricher;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("materials_analyzer=info,warn")
        .init();

    let matches = Command::new("Materials Analyzer")
        .version("0.1.0")
        .about("Learning materials metadata extender")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("PATH")
                .help("Materials dump (JSON file or a directory of dumps)")
                .required(true),
        )
        .arg(
            Arg::new("update")
                .short('u')
                .long("update")
                .help("Write the enriched metadata back to the dump")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let file = PathBuf::from(matches.get_one::<String>("file").unwrap());
    let update = matches.get_flag("update");

    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    // Load configuration
    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::from_env()
        }),
    };
    config.validate()?;

    info!("🚀 Materials Analyzer starting...");
    info!("📁 Input: {}", file.display());
    if update {
        info!("💾 Metadata will be written back");
    }

    if !file.exists() {
        error!("Input does not exist: {}", file.display());
        return Err(anyhow::anyhow!("Input not found"));
    }

    let enricher = MaterialEnricher::new(config)?;

    let start_time = std::time::Instant::now();
    let stats = enricher.enrich_path(&file, update).await?;
    let duration = start_time.elapsed();

    info!("🎉 Enrichment completed in {:.2}s", duration.as_secs_f64());
    info!("📦 Materials: {}", stats.total);
    info!("✅ Enriched: {}", stats.enriched);
    info!("⏭️ Skipped: {}", stats.skipped);
    info!("❌ Failed: {}", stats.failed);
    info!("🔎 Video lookups: {}", stats.video_lookups);

    Ok(())
}
