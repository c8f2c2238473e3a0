//! Turns gridded moisture fields into per-timestep RGB frames.
//!
//! Two variants share one pipeline:
//!
//! - [`run_anomaly`]: total column water, its monthly climatology from a
//!   baseline dataset, and the anomaly between them
//! - [`run_water_budget`]: precipitation, evaporation and total column water
//!
//! Both resolve their variables through alias lists, compute a single
//! [`LongitudeShift`] from the canonical grid, and stream the time axis in
//! blocks through a [`TimeBlockStreamer`] into a [`FrameSink`].

pub mod catalog;
pub mod climatology;
pub mod config;
pub mod realign;
pub mod recipe;
pub mod sink;
pub mod streamer;

pub use catalog::{frame_name_for_datehour, CatalogError, FrameCatalog};
pub use climatology::{required_months, ClimatologyTable};
pub use config::{ChannelScales, InputPaths, PipelineConfig};
pub use realign::{check_longitude_axis, LongitudeShift};
pub use recipe::{AnomalyRecipe, FrameRecipe, WaterBudgetRecipe};
pub use sink::{CollectingSink, FrameSink, PngDirectorySink};
pub use streamer::{block_ranges, StreamSummary, TimeBlockStreamer};

use moisture_common::{
    resolve_time_coordinate, resolve_variable, FrameResult, GridDataset, TOTAL_COLUMN_WATER_ALIASES,
};
use tracing::info;

/// Render anomaly frames from an instantaneous and a baseline dataset.
///
/// The climatology is built for every month that both appears in the
/// instantaneous series and is selected by `config.months`; a selected month
/// absent from the baseline aborts before any frame is written.
pub fn run_anomaly<I, B, S>(
    config: &PipelineConfig,
    instant: &I,
    baseline: &B,
    sink: &S,
) -> FrameResult<StreamSummary>
where
    I: GridDataset + ?Sized,
    B: GridDataset + ?Sized,
    S: FrameSink + ?Sized,
{
    config.validate()?;

    let variable = resolve_variable(instant, TOTAL_COLUMN_WATER_ALIASES)?;
    let (times, shape) = recipe::timed_shape(instant, &variable)?;

    let shift = LongitudeShift::from_grid(shape.grid);
    check_longitude_axis("instant", instant)?;
    check_longitude_axis("baseline", baseline)?;

    let baseline_variable = resolve_variable(baseline, TOTAL_COLUMN_WATER_ALIASES)?;
    let baseline_times = baseline.read_times(&resolve_time_coordinate(baseline)?)?;
    let required = required_months(&times, &config.months);

    info!(
        variable = %variable,
        baseline_variable = %baseline_variable,
        months = ?required,
        nlat = shape.grid.nlat,
        nlon = shape.grid.nlon,
        "Building climatology"
    );

    let climatology = ClimatologyTable::build(
        baseline,
        &baseline_variable,
        &baseline_times,
        &required,
        shape.grid,
        shift,
        config.time_block,
    )?;

    let recipe = AnomalyRecipe::with_parts(
        instant,
        variable,
        times,
        shape.grid,
        &climatology,
        &config.channels,
    )?;
    let summary = TimeBlockStreamer::new(config.time_block, shift)?.run(&recipe, sink)?;

    info!(
        frames_written = summary.frames_written,
        skipped = summary.skipped,
        "Anomaly run complete"
    );
    Ok(summary)
}

/// Render water-budget frames from an accumulated and an instantaneous
/// dataset. Every timestep produces a frame.
pub fn run_water_budget<A, I, S>(
    config: &PipelineConfig,
    accumulated: &A,
    instant: &I,
    sink: &S,
) -> FrameResult<StreamSummary>
where
    A: GridDataset + ?Sized,
    I: GridDataset + ?Sized,
    S: FrameSink + ?Sized,
{
    config.validate()?;

    let recipe = WaterBudgetRecipe::new(accumulated, instant, &config.channels)?;
    let shift = LongitudeShift::from_grid(recipe.grid());
    check_longitude_axis("accumulated", accumulated)?;
    check_longitude_axis("instant", instant)?;

    let summary = TimeBlockStreamer::new(config.time_block, shift)?.run(&recipe, sink)?;

    info!(
        frames_written = summary.frames_written,
        "Water-budget run complete"
    );
    Ok(summary)
}
