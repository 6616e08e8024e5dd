//! demogen CLI - adaptive demographic data collection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use demogen::{build_source, sample_tracts, CollectionPipeline, Config};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "demogen")]
#[command(version)]
#[command(about = "Adaptive demographic data collection agent for food-access analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collection over the built-in tract sample
    Collect {
        /// Override the configured number of tracts
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

/// Console logging, plus a collection.log file when a log directory is
/// given. The returned guard must outlive the run to flush the file.
fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, "collection.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(LevelFilter::from_level(level))
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(file_writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(LevelFilter::from_level(level))
                .with(console)
                .init();
            Ok(None)
        }
    }
}

fn print_example_config() {
    let example = r#"# demogen configuration file

[collection]
min_delay_seconds = 1.0
min_quality_threshold = 0.7
target_tracts = 10

[census]
# api_key = "..."    # or set CENSUS_API_KEY; absent key selects mock data
api_key_env = "CENSUS_API_KEY"
base_url = "https://api.census.gov/data"
year = 2021
dataset = "acs/acs5"
timeout_secs = 30

[variables]
median_income = "B19013_001E"
poverty_rate = "S1701_C03_001E"
total_population = "B01003_001E"
white_population = "B02001_002E"
black_population = "B02001_003E"
vehicle_available = "B08201_001E"
no_vehicle = "B08201_002E"
snap_benefits = "B22010_002E"

[quality]
required_fields = ["median_income", "poverty_rate", "total_population"]
population_field = "total_population"
rate_field = "poverty_rate"

[quality.valid_ranges]
median_income = [1000.0, 500000.0]
poverty_rate = [0.0, 100.0]
total_population = [0.0, 100000.0]

[paths]
logs = "logs"
raw_data = "data/raw"
metadata = "data/metadata"
reports = "reports"
"#;
    println!("{example}");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Example => {
            print_example_config();
            Ok(())
        }

        Commands::Validate => {
            setup_logging(cli.verbose, None)?;
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            info!("Configuration is valid");
            info!(
                "  Target tracts: {} (threshold: {:.0}%)",
                config.collection.target_tracts,
                config.collection.min_quality_threshold * 100.0
            );
            info!("  Variables: {}", config.variables.len());
            match config.resolve_api_key() {
                Some(_) => info!("  Census API key resolved, live collection enabled"),
                None => info!("  No Census API key, collection would use mock data"),
            }
            Ok(())
        }

        Commands::Collect { limit } => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            let _guard = setup_logging(cli.verbose, Some(&config.paths.logs))?;

            let target = limit.unwrap_or(config.collection.target_tracts);
            let tracts = sample_tracts(target);

            let source = build_source(&config).context("Failed to build data source")?;
            let pipeline = CollectionPipeline::new(config.clone(), source);
            let outcome = pipeline.run(tracts).await;

            let paths =
                demogen::report::write_all(&config, &outcome).context("Failed to write reports")?;

            println!("\n=== Collection Complete ===");
            println!("Collected:   {}", outcome.records.len());
            println!("Failed:      {}", outcome.failed_tracts.len());
            println!("Avg quality: {:.3}", outcome.stats.average_quality());
            println!("Final delay: {:.1}s", outcome.final_delay_secs);
            println!("Raw data:    {}", paths.raw_json.display());
            println!("Summary:     {}", paths.summary.display());
            Ok(())
        }
    }
}
