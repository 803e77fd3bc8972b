//! dailybar CLI — build and check normalized daily bundles.
//!
//! Commands:
//! - `build` — normalize every configured symbol and write the bundle
//! - `verify` — re-check a written bundle against its calendar and manifest
//! - `sessions` — list exchange sessions in a date range
//! - `init-config` — write a starter bundle config

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dailybar_core::calendar::calendar_by_name;
use dailybar_runner::{build_bundle, verify_from_config, BundleConfig, LogProgress};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "dailybar=info,dailybar_core=info,dailybar_runner=info";

#[derive(Parser)]
#[command(
    name = "dailybar",
    about = "Normalize raw daily OHLCV data into gap-free bundle files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every configured symbol and write the bundle.
    Build {
        /// Path to the bundle TOML config.
        #[arg(long, default_value = "bundle.toml")]
        config: PathBuf,

        /// Override the configured output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Re-check written files against the calendar and manifest.
    Verify {
        /// Path to the bundle TOML config.
        #[arg(long, default_value = "bundle.toml")]
        config: PathBuf,
    },
    /// List exchange sessions in a date range.
    Sessions {
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Exchange calendar name.
        #[arg(long, default_value = "XNYS")]
        calendar: String,

        /// Only print the session count.
        #[arg(long, default_value_t = false)]
        count: bool,
    },
    /// Write a starter bundle config.
    InitConfig {
        /// Destination path.
        #[arg(default_value = "bundle.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config, output_dir } => run_build(&config, output_dir),
        Commands::Verify { config } => run_verify(&config),
        Commands::Sessions {
            start,
            end,
            calendar,
            count,
        } => run_sessions(&start, &end, &calendar, count),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn run_build(config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    info!(config = %config_path.display(), "loading bundle config");
    let mut config = BundleConfig::from_file(config_path)?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let outcome = build_bundle(&config, &LogProgress)?;
    let summary = &outcome.summary;

    println!(
        "Built {} of {} symbols into {}",
        summary.succeeded(),
        summary.total,
        config.output_dir.display()
    );
    for o in &summary.outcomes {
        let r = &o.report;
        println!(
            "  {:<10} {:>6} rows  dropped {:>4}  filled {:>4}  patched {:>2}  clamped {:>3}  {}",
            o.symbol,
            o.rows,
            r.dropped(),
            r.forward_filled,
            r.anomaly_patched,
            r.clamped,
            o.hash.short()
        );
    }
    println!("Manifest: {}", outcome.manifest_path.display());

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_verify(config_path: &Path) -> Result<()> {
    let config = BundleConfig::from_file(config_path)?;
    let report = verify_from_config(&config)?;

    if report.is_clean() {
        println!(
            "All {} symbols verified in {}",
            report.checks.len(),
            config.output_dir.display()
        );
        return Ok(());
    }

    for check in report.failing() {
        for problem in &check.problems {
            eprintln!("{}: {problem}", check.symbol);
        }
    }
    eprintln!(
        "{} of {} symbols failed verification",
        report.failing().count(),
        report.checks.len()
    );
    std::process::exit(1);
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn run_sessions(start: &str, end: &str, calendar: &str, count: bool) -> Result<()> {
    let exchange = calendar_by_name(calendar)?;
    let sessions = exchange.sessions(parse_date(start)?, parse_date(end)?)?;

    if count {
        println!("{}", sessions.len());
    } else {
        for date in sessions.dates() {
            println!("{date}");
        }
    }
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let text = BundleConfig::starter().to_toml()?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote starter config to {}", path.display());
    Ok(())
}
