//! Command-line arguments and their merge into [`PipelineConfig`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use frame_pipeline::PipelineConfig;

/// Moisture frame exporter
#[derive(Parser, Debug)]
#[command(name = "frame-exporter")]
#[command(about = "Encode moisture reanalysis fields as per-timestep RGB PNG frames")]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "FRAME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "FRAME_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Number of encoding threads (default: one per core)
    #[arg(long, env = "FRAME_THREADS")]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Total column water, its monthly climatology and the anomaly
    Anomaly {
        #[command(flatten)]
        run: RunArgs,

        /// Instantaneous total column water dataset
        #[arg(long)]
        instant: Option<PathBuf>,

        /// Multi-year baseline dataset
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Calendar months to render, comma separated
        #[arg(long, value_delimiter = ',')]
        months: Option<Vec<u32>>,
    },

    /// Precipitation, evaporation and total column water
    WaterBudget {
        #[command(flatten)]
        run: RunArgs,

        /// Accumulated precipitation/evaporation dataset
        #[arg(long)]
        accumulated: Option<PathBuf>,

        /// Instantaneous total column water dataset
        #[arg(long)]
        instant: Option<PathBuf>,
    },

    /// Print the path of the frame covering an hour
    Lookup {
        /// UTC hour as YYYY-MM-DDTHH:mm
        #[arg(long)]
        datehour: String,

        /// Frame directory (default: configured output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Options shared by the rendering subcommands.
#[derive(ClapArgs, Debug, Default)]
pub struct RunArgs {
    /// Output directory for PNG frames
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Timesteps loaded per block
    #[arg(long)]
    pub time_block: Option<usize>,
}

/// Defaults, then the YAML file, then `FRAME_*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid FRAME_* environment override")?;
    Ok(config)
}

impl Command {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        match self {
            Command::Anomaly {
                run,
                instant,
                baseline,
                months,
            } => {
                run.apply_to(config);
                if let Some(path) = instant {
                    config.inputs.instant = Some(path.clone());
                }
                if let Some(path) = baseline {
                    config.inputs.baseline = Some(path.clone());
                }
                if let Some(months) = months {
                    config.months = months.clone();
                }
            }
            Command::WaterBudget {
                run,
                accumulated,
                instant,
            } => {
                run.apply_to(config);
                if let Some(path) = accumulated {
                    config.inputs.accumulated = Some(path.clone());
                }
                if let Some(path) = instant {
                    config.inputs.instant = Some(path.clone());
                }
            }
            Command::Lookup { output_dir, .. } => {
                if let Some(dir) = output_dir {
                    config.output_dir = dir.clone();
                }
            }
        }
    }
}

impl RunArgs {
    fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(block) = self.time_block {
            config.time_block = block;
        }
    }
}
