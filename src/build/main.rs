//! Gazetteer build pipeline.
//!
//! Reads administrative polygons and Geonames cities, attaches every city
//! to a region, and writes the flat gazetteer table.

mod input;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gazetteer::{build_gazetteer, BuildConfig};

use crate::input::{load_places, load_polygons};
use crate::output::{write_gazetteer, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "build-gazetteer")]
#[command(about = "Build a place/region gazetteer from boundary polygons and Geonames cities")]
struct Args {
    /// Line-delimited JSON polygon table with GADM attribute names
    #[arg(long)]
    regions: PathBuf,

    /// Geonames cities TSV (optionally .gz)
    #[arg(long)]
    places: PathBuf,

    /// Output file; a .gz suffix enables compression
    #[arg(short, long)]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// TOML build configuration (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.debug { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Gazetteer Build Pipeline");

    let config = match &args.config {
        Some(path) => {
            info!("Using config {}", path.display());
            BuildConfig::load_from_file(path)?
        }
        None => BuildConfig::default(),
    };

    let polygons = load_polygons(&args.regions)?;
    let places = load_places(&args.places)?;

    let gazetteer = build_gazetteer(polygons, places, &config).context("Gazetteer build failed")?;

    if !gazetteer.overflow.is_empty() {
        warn!(
            "Alternate names truncated on {} place rows and {} region rows",
            gazetteer.overflow.place_rows, gazetteer.overflow.region_rows
        );
    }

    write_gazetteer(&args.output, args.format, &gazetteer)?;

    info!("Build complete: {} regions", gazetteer.regions.len());
    Ok(())
}
