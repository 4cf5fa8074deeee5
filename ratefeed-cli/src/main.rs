//! ratefeed CLI: refresh the tracker pages, or check them for markers.
//!
//! Commands:
//! - `run` (default): fetch FX rates and the Bund yield, patch both pages
//! - `check`: report whether each page carries the markers a refresh rewrites

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use ratefeed_core::driver::{inspect_artifacts, run_refresh_with};
use ratefeed_core::patch::ArtifactStatus;
use ratefeed_core::{BundesbankYields, RefreshConfig, StdoutProgress, YahooQuotes};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "ratefeed",
    version,
    about = "Refresh FX rates and the 10Y Bund yield in the static tracker pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to a TOML config file. Unset keys keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the page paths are relative to.
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Override the currency page path.
    #[arg(long, global = true)]
    currency_file: Option<PathBuf>,

    /// Override the bond page path.
    #[arg(long, global = true)]
    bond_file: Option<PathBuf>,

    /// Log level for diagnostics on stderr: error, warn, info, debug, trace.
    #[arg(long, global = true, env = "RATEFEED_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Fetch rates and the yield, then patch both pages (the default).
    Run,
    /// Check both pages for the assignment and lastUpdated markers. No network.
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.global.log_level)?;
    let config = load_config(&cli.global)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_refresh_cmd(&config),
        Commands::Check => run_check(&config),
    }
}

fn init_logger(level: &str) -> Result<()> {
    let level = Level::from_str(level.trim())
        .map_err(|_| anyhow::anyhow!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(args: &GlobalArgs) -> Result<RefreshConfig> {
    let mut config = match &args.config {
        Some(path) => RefreshConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RefreshConfig::default(),
    };

    if let Some(path) = &args.currency_file {
        config.currency_file = path.clone();
    }
    if let Some(path) = &args.bond_file {
        config.bond_file = path.clone();
    }

    Ok(config.rooted_at(&args.dir))
}

fn run_refresh_cmd(config: &RefreshConfig) -> Result<()> {
    let outcome = run_refresh_with(
        config,
        YahooQuotes::new,
        BundesbankYields::new,
        &StdoutProgress,
        Utc::now(),
    );

    if outcome.all_failed() {
        std::process::exit(outcome.exit_code().into());
    }

    Ok(())
}

fn run_check(config: &RefreshConfig) -> Result<()> {
    let statuses = inspect_artifacts(config)?;

    println!("{:<10} {:<8} {:<12} {:<10} Path", "Page", "Exists", "Assignment", "Timestamp");
    println!("{}", "-".repeat(60));

    let mut broken = 0;
    for (pipeline, path, status) in &statuses {
        let (exists, assignment, timestamp) = match status {
            ArtifactStatus::Missing => ("no", "-", "-"),
            ArtifactStatus::Present {
                assignment,
                timestamp,
            } => ("yes", yes_no(*assignment), yes_no(*timestamp)),
        };
        if !status.is_patchable() {
            broken += 1;
        }
        println!(
            "{:<10} {:<8} {:<12} {:<10} {}",
            pipeline.to_string(),
            exists,
            assignment,
            timestamp,
            path.display()
        );
    }

    if broken > 0 {
        println!();
        println!("WARNING: {broken} page(s) are missing a marker; a refresh would leave part of them stale");
        std::process::exit(1);
    }

    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "NO"
    }
}
