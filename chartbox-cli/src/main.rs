//! A minimal CLI driver for `chartbox`. Reads a boundary feature file (and
//! optionally a contour feature file) into a [`ChartBox`], then optionally
//! samples any combination of the boundary layer, the contour layer, and
//! the full composite to PNG.
//!
//! Exit codes: `0` success, `2` input not found, `3` bounding-box/feature
//! load failure, `4` raster sink failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{error, info};

use chartbox::chart_box::{ChartBox, Role};
use chartbox::frame::{init_proj_data, FrameMapping};
use chartbox::io::{PngRasterSink, RasterSink, TextFeatureSource};
use chartbox::layer::Layer;

#[derive(Parser)]
#[command(version, about = "Tiled rolling-grid navigational chart engine", long_about = None)]
struct Cli {
    /// Boundary feature file: one BBOX line plus BOUNDARY (and optionally
    /// CONTOUR) features, in the `TextFeatureSource` format.
    boundary_input: PathBuf,

    /// Additional CONTOUR-only feature file.
    #[arg(long)]
    contour_input: Option<PathBuf>,

    /// Directory backing the rolling-grid sector cache, if any layer uses one.
    #[arg(long = "cache-dir")]
    cache_dir: Option<PathBuf>,

    /// Write the boundary layer alone to this PNG.
    #[arg(long = "boundary-output")]
    boundary_output: Option<PathBuf>,

    /// Write the contour layer alone to this PNG.
    #[arg(long = "contour-output")]
    contour_output: Option<PathBuf>,

    /// Write the composite classification to this PNG.
    #[arg(long = "composite-output")]
    composite_output: Option<PathBuf>,

    /// UTM zone number to project into.
    #[arg(long, default_value_t = 19)]
    zone: u32,

    /// Northern hemisphere (pass `--northern=false` for southern).
    #[arg(long, default_value_t = true)]
    northern: bool,

    /// PROJ resource directory, passed once to `chartbox::frame::init_proj_data`.
    #[arg(long = "proj-data", default_value = "/usr/share/proj")]
    proj_data: PathBuf,

    /// Sample spacing, in meters, for raster sink output.
    #[arg(long, default_value_t = 4.0)]
    precision: f64,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[derive(Debug)]
enum CliError {
    InputNotFound(PathBuf),
    LoadFailure(anyhow::Error),
    SinkFailure(anyhow::Error),
}

impl CliError {
    const fn exit_code(&self) -> u8 {
        match self {
            Self::InputNotFound(_) => 2,
            Self::LoadFailure(_) => 3,
            Self::SinkFailure(_) => 4,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputNotFound(path) => write!(f, "input not found: {}", path.display()),
            Self::LoadFailure(e) => write!(f, "failed to load chart: {e}"),
            Self::SinkFailure(e) => write!(f, "failed to write raster sink: {e}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(level_from(&cli.verbosity))
        .with_file(true)
        .with_line_number(true)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn level_from(verbosity: &Verbosity<InfoLevel>) -> tracing::Level {
    match verbosity.log_level_filter() {
        clap_verbosity_flag::log::LevelFilter::Off => tracing::Level::ERROR,
        clap_verbosity_flag::log::LevelFilter::Error => tracing::Level::ERROR,
        clap_verbosity_flag::log::LevelFilter::Warn => tracing::Level::WARN,
        clap_verbosity_flag::log::LevelFilter::Info => tracing::Level::INFO,
        clap_verbosity_flag::log::LevelFilter::Debug => tracing::Level::DEBUG,
        clap_verbosity_flag::log::LevelFilter::Trace => tracing::Level::TRACE,
    }
}

fn require_exists(path: &std::path::Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::InputNotFound(path.to_path_buf()))
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    init_proj_data(&cli.proj_data);

    require_exists(&cli.boundary_input)?;
    let mut boundary_source = TextFeatureSource::from_path(&cli.boundary_input)
        .map_err(|e| CliError::LoadFailure(e.into()))?;

    let mapping =
        FrameMapping::new(cli.zone, cli.northern).map_err(|e| CliError::LoadFailure(e.into()))?;
    let mut chart = ChartBox::from_source(mapping, &mut boundary_source)
        .map_err(|e| CliError::LoadFailure(e.into()))?;
    info!(path = %cli.boundary_input.display(), "loaded boundary chart");

    if let Some(contour_input) = &cli.contour_input {
        require_exists(contour_input)?;
        let mut contour_source = TextFeatureSource::from_path(contour_input)
            .map_err(|e| CliError::LoadFailure(e.into()))?;
        chart
            .ingest(&mut contour_source)
            .map_err(|e| CliError::LoadFailure(e.into()))?;
        info!(path = %contour_input.display(), "ingested contour features");
    }

    let bounds = chart.mapping().local_bounds();

    if let Some(path) = cli.boundary_output {
        write_layer(&chart, Role::Boundary, &bounds, cli.precision, path)?;
    }
    if let Some(path) = cli.contour_output {
        write_layer(&chart, Role::Contour, &bounds, cli.precision, path)?;
    }
    if let Some(path) = cli.composite_output {
        let classify = |p| chart.classify(p);
        PngRasterSink::new(path)
            .write(&classify, &bounds, cli.precision)
            .map_err(|e| CliError::SinkFailure(e.into()))?;
    }

    Ok(())
}

fn write_layer(
    chart: &ChartBox,
    role: Role,
    bounds: &chartbox::geometry::BoundBox<chartbox::geometry::Local>,
    precision: f64,
    path: PathBuf,
) -> Result<(), CliError> {
    let layer = chart.layer(role);
    let classify = |p| layer.get(p);
    PngRasterSink::new(path)
        .write(&classify, bounds, precision)
        .map_err(|e| CliError::SinkFailure(e.into()))
}
