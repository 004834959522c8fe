//! `lsn-fetch`: fetch one LSN-Online table and print it as JSON or CSV.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use lsn_client::domain::constants::{regions, tables};
use lsn_client::infrastructure::export::{self, ExportFormat};
use lsn_client::infrastructure::logging::{init_logging_with_config, log_system_info};
use lsn_client::{HierarchyLevel, LsnClient, LsnConfig};

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Full result (region, rows, timestamp)
    Json,
    /// Rows only, one line per year
    Csv,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => Self::Json,
            Format::Csv => Self::Csv,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "lsn-fetch",
    about = "Fetch municipal tax revenue tables from LSN-Online",
    version
)]
struct Cli {
    /// Region id (9 digits)
    #[arg(long, default_value = regions::NORDSTEMMEN)]
    region: String,

    /// Hierarchy level: land, region, kreis, samtgemeinde, gemeinde (or 1-5)
    #[arg(long, default_value = "gemeinde")]
    level: HierarchyLevel,

    /// Table id
    #[arg(long, default_value = tables::STEUEREINNAHMEN_ZEITREIHE)]
    table: String,

    /// Configuration file (defaults to ./lsn-client.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Print known regions and tables, then exit
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn print_catalog() {
    println!("Regions:");
    for (name, id) in regions::KNOWN_REGIONS {
        println!("  {id}  {name}");
    }
    println!("Tables:");
    for (name, id) in tables::KNOWN_TABLES {
        println!("  {id}  {name}");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.list {
        print_catalog();
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = LsnConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    info!(
        "🚀 Fetching table {} for region {} (level {})",
        cli.table, cli.region, cli.level
    );
    let client = LsnClient::new(config).context("Failed to create LSN client")?;

    let Some(result) = client.fetch_table(&cli.table, &cli.region, cli.level).await else {
        eprintln!("No result for table {} / region {}", cli.table, cli.region);
        return Ok(ExitCode::from(1));
    };

    let format = ExportFormat::from(cli.format);
    match &cli.output {
        Some(path) => export::write(&result, path, format).await?,
        None => println!("{}", export::render(&result, format)?.trim_end()),
    }

    if result.is_empty() {
        eprintln!("No rows extracted for {}", result.region.name);
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
