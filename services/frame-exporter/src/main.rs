//! Frame exporter
//!
//! Reads reanalysis NetCDF files and writes one RGB PNG per timestep, or
//! looks up an already rendered frame by hour.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use frame_pipeline::{
    run_anomaly, run_water_budget, FrameCatalog, PipelineConfig, PngDirectorySink, StreamSummary,
};
use netcdf_parser::NetCdfDataset;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Args, Command, LogFormat};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format);

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure encoding thread pool")?;
    }

    let mut config = cli::load_config(args.config.as_deref())?;
    args.command.apply_to(&mut config);

    match &args.command {
        Command::Anomaly { .. } => {
            let summary = anomaly(&config)?;
            report(&config, summary);
        }
        Command::WaterBudget { .. } => {
            let summary = water_budget(&config)?;
            report(&config, summary);
        }
        Command::Lookup { datehour, .. } => {
            let path = FrameCatalog::new(&config.output_dir)
                .lookup(datehour)
                .with_context(|| format!("No frame for {datehour}"))?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn anomaly(config: &PipelineConfig) -> Result<StreamSummary> {
    let instant = open_input("instant", config.inputs.instant.as_deref())?;
    let baseline = open_input("baseline", config.inputs.baseline.as_deref())?;
    let sink = create_sink(config)?;

    info!(
        instant = %instant.path().display(),
        baseline = %baseline.path().display(),
        output_dir = %config.output_dir.display(),
        "Starting anomaly export"
    );
    run_anomaly(config, &instant, &baseline, &sink).context("Anomaly export failed")
}

fn water_budget(config: &PipelineConfig) -> Result<StreamSummary> {
    let accumulated = open_input("accumulated", config.inputs.accumulated.as_deref())?;
    let instant = open_input("instant", config.inputs.instant.as_deref())?;
    let sink = create_sink(config)?;

    info!(
        accumulated = %accumulated.path().display(),
        instant = %instant.path().display(),
        output_dir = %config.output_dir.display(),
        "Starting water-budget export"
    );
    run_water_budget(config, &accumulated, &instant, &sink).context("Water-budget export failed")
}

fn open_input(role: &str, path: Option<&Path>) -> Result<NetCdfDataset> {
    let path = path.with_context(|| {
        format!("No {role} dataset configured (set inputs.{role} or pass --{role})")
    })?;
    NetCdfDataset::open(path).with_context(|| format!("Failed to open {role} dataset {}", path.display()))
}

fn create_sink(config: &PipelineConfig) -> Result<PngDirectorySink> {
    PngDirectorySink::create(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })
}

fn report(config: &PipelineConfig, summary: StreamSummary) {
    info!(
        frames_written = summary.frames_written,
        skipped = summary.skipped,
        blocks = summary.blocks,
        output_dir = %config.output_dir.display(),
        "Export finished"
    );
}
