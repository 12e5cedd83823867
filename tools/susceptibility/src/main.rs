//! Landslide susceptibility scenario runner.
//!
//! Reads the base susceptibility map, predictor layers, daily rainfall and
//! land-use rasters from a data directory, runs every climate scenario and
//! writes one PNG + GeoTIFF per (scenario, day).
mod export;
mod geotiff;
mod inputs;
mod render;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use landslide_core::ScenarioDriver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use export::{write_tables, MapExporter};
use inputs::{load_inputs, ToolConfig};

#[derive(Parser, Debug)]
#[command(
    name = "susceptibility",
    about = "Landslide susceptibility maps under IPCC precipitation scenarios"
)]
struct Args {
    /// Directory containing the input GeoTIFFs
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Output directory for maps (created if absent)
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// JSON run configuration (weights, scenarios, file names, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for the precipitation jitter (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Skip PNG rendering
    #[arg(long)]
    no_png: bool,

    /// Skip GeoTIFF export
    #[arg(long)]
    no_geotiff: bool,

    /// Write importance.json and influence.json to this directory
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    let start = Instant::now();

    let mut cfg = match &args.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };
    if args.seed.is_some() {
        cfg.run.seed = args.seed;
    }
    // Log the seed even when unseeded so any run can be repeated.
    let seed = cfg.run.seed.unwrap_or_else(rand::random);
    info!("Seed: {seed}");

    let driver = ScenarioDriver::new(&cfg.run).context("Invalid run configuration")?;
    let (inputs, reference) = load_inputs(&args.data_dir, &cfg.inputs, &cfg.run)?;

    let mut exporter = MapExporter::new(&args.output_dir, reference, cfg.run.color_range)?
        .with_formats(!args.no_png, !args.no_geotiff);
    let mut rng = StdRng::seed_from_u64(seed);

    let output = driver.run(&inputs, &mut exporter, &mut rng)?;

    for scenario in &cfg.run.scenarios {
        for record in output.influence.for_scenario(&scenario.name) {
            info!(
                "{} day {}: {} mean susceptibility {:.4}",
                record.scenario, record.day, record.lulc_class, record.influence
            );
        }
    }
    if let Some(dir) = &args.tables {
        write_tables(dir, &output)?;
    }

    info!(
        "Done: {} files, {} importance rows, {} influence rows in {:.2?}",
        exporter.written().len(),
        output.importance.len(),
        output.influence.len(),
        start.elapsed()
    );
    Ok(())
}
