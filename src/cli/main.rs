//! Command line tools around the zoning map editor core.
//!
//! Runs the constraint engine and audits over local GeoJSON files, and
//! moves GeoJSON in and out of the zoning backend.

mod geojson_io;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geojson::Geometry;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zonemap::api::{HttpZoneApi, ImportTarget, ZoneApi};
use zonemap::config::Config;
use zonemap::constraint::audit;
use zonemap::{ConstraintEngine, TrimStrategy, ZoneSet};

use crate::geojson_io::{close_all, first_geometry, read_geojson, read_zones, write_output};

#[derive(Parser, Debug)]
#[command(name = "zonemap")]
#[command(about = "Clip, check and transfer zoning map geometry")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the backend API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// CSRF token for mutating requests
    #[arg(long, global = true)]
    csrf_token: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clip a candidate shape to a boundary and trim it against existing zones
    Clip {
        /// GeoJSON with the candidate polygon
        #[arg(long)]
        candidate: PathBuf,

        /// GeoJSON with the enclosing boundary
        #[arg(long)]
        boundary: Option<PathBuf>,

        /// FeatureCollection of existing zones to trim against
        #[arg(long)]
        zones: Option<PathBuf>,

        /// Trim strategy, overrides the config file
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<TrimStrategy>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Report overlapping zoning zones and zones outside every barangay
    Check {
        #[arg(long)]
        zones: PathBuf,
    },

    /// Close the rings of every polygon in a GeoJSON document
    Close {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Download all zones and boundaries as GeoJSON
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Upload a GeoJSON file to the backend
    Import {
        #[arg(short, long)]
        file: PathBuf,

        /// municipal or zones
        #[arg(long)]
        target: ImportTarget,
    },
}

fn parse_strategy(s: &str) -> Result<TrimStrategy, String> {
    match s {
        "sequential" => Ok(TrimStrategy::Sequential),
        "union" => Ok(TrimStrategy::Union),
        other => Err(format!(
            "unknown strategy '{}', expected 'sequential' or 'union'",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    if args.csrf_token.is_some() {
        config.api.csrf_token = args.csrf_token;
    }

    match args.command {
        Command::Clip {
            candidate,
            boundary,
            zones,
            strategy,
            out,
        } => {
            if let Some(strategy) = strategy {
                config.constraint.trim_strategy = strategy;
            }
            clip(&config, &candidate, boundary.as_deref(), zones.as_deref(), out.as_deref())
        }
        Command::Check { zones } => check(&config, &zones),
        Command::Close { input, out } => {
            let closed = close_all(read_geojson(&input)?);
            write_output(out.as_deref(), closed.to_string().as_bytes())
        }
        Command::Export { out } => {
            let api = HttpZoneApi::new(&config.api)?;
            info!("Exporting from {}", api.base_url());
            let bytes = api.export_geojson().await.context("Export failed")?;
            write_output(out.as_deref(), &bytes)
        }
        Command::Import { file, target } => {
            let api = HttpZoneApi::new(&config.api)?;
            if config.api.csrf_token.is_none() {
                warn!("No CSRF token configured; the backend may refuse the upload");
            }
            let bytes = fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("import.geojson");
            api.import_geojson(target, name, bytes)
                .await
                .context("Import failed")?;
            info!("Imported {} as {}", file.display(), target);
            Ok(())
        }
    }
}

fn load_geometry(path: &Path) -> Result<Geometry> {
    first_geometry(read_geojson(path)?)
        .with_context(|| format!("{} contains no geometry", path.display()))
}

fn clip(
    config: &Config,
    candidate: &Path,
    boundary: Option<&Path>,
    zones: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let engine = ConstraintEngine::from_config(&config.constraint);
    let candidate = load_geometry(candidate)?;
    let boundary = boundary.map(load_geometry).transpose()?;
    let set = ZoneSet::new(match zones {
        Some(path) => read_zones(path)?,
        None => Vec::new(),
    });
    let others = set.zoning_neighbours(None);

    info!(
        "Clipping against {} zones ({:?} strategy)",
        others.len(),
        engine.strategy()
    );
    let constrained = engine
        .constrain_with_report(&candidate, boundary.as_ref(), &others)
        .context("Shape rejected")?;
    info!(
        "Kept {:.1}% of the drawn area ({} neighbours trimmed)",
        constrained.report.retained_ratio * 100.0,
        constrained.report.trimmed_against
    );

    write_output(out, serde_json::to_string(&constrained.geometry)?.as_bytes())
}

fn check(config: &Config, zones: &Path) -> Result<()> {
    let set = ZoneSet::new(read_zones(zones)?);
    let report = audit(&set, config.constraint.min_area);

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_clean() {
        anyhow::bail!(
            "{} overlaps and {} zones outside a single barangay",
            report.overlaps.len(),
            report.uncontained.len()
        );
    }
    Ok(())
}
