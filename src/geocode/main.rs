//! Offline batch reverse geocoder.
//!
//! Reads a point table, resolves each point against the reference layers
//! and writes the augmented table plus a missing-value report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sarvekshan::config::Config;
use sarvekshan::io::{read_points, write_output, FileLayerLoader};
use sarvekshan::pipeline::Geocoder;
use sarvekshan::projection::Proj4Projection;
use sarvekshan::report::MissingValueReport;

#[derive(Parser, Debug)]
#[command(name = "geocode")]
#[command(about = "Reverse geocode a point table against Indian administrative boundaries")]
struct Args {
    /// TOML configuration (defaults to the reference deployment)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Point table CSV, overrides the configured source
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output CSV, overrides the configured path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads for point resolution
    #[arg(long)]
    threads: Option<usize>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::reference(),
    };
    if let Some(input) = args.input {
        config.points.path = input;
    }
    if let Some(output) = args.output {
        config.output.path = output;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    config.validate().context("Invalid configuration")?;

    info!("Sarvekshan reverse geocoder");
    info!("Input: {}", config.points.path.display());

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    let table = read_points(
        &config.points.path,
        &config.points.latitude_field,
        &config.points.longitude_field,
    )
    .context("Failed to read point table")?;

    let projection = Proj4Projection::new(&config.projection).context("Invalid projection")?;
    info!("Projection: {}", projection.definition());
    let geocoder = Geocoder::build(&config, &FileLayerLoader, &projection)
        .context("Failed to load reference layers")?;

    // Create progress bar
    let pb = if args.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(table.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let resolution = geocoder
        .resolve_all(&table.records, &projection, |n| pb.inc(n))
        .context("Failed to resolve points")?;
    pb.finish_and_clear();

    write_output(
        &config.output.path,
        &table,
        &resolution.records,
        config.postal_column(),
    )
    .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    resolution.summary.log();
    MissingValueReport::build(
        &table,
        &resolution.records,
        [
            config.points.latitude_field.as_str(),
            config.points.longitude_field.as_str(),
        ],
        config.postal_column(),
    )
    .log();

    info!("Output: {}", config.output.path.display());
    Ok(())
}
