//! Frame recipes: which fields land on which channel.
//!
//! A recipe owns the canonical time axis, knows how to load and realign one
//! block of its inputs, and turns one timestep of that block into a frame (or
//! declines to).

use std::ops::Range;

use chrono::{Datelike, NaiveDateTime};
use moisture_common::{
    resolve_time_coordinate, resolve_variable, FieldShape, FrameError, FrameResult, GridDataset,
    GridShape, TimeBlock, EVAPORATION_ALIASES, PRECIPITATION_ALIASES, TOTAL_COLUMN_WATER_ALIASES,
};
use renderer::{EncodedFrame, ScalingLaw};

use crate::climatology::ClimatologyTable;
use crate::config::ChannelScales;
use crate::realign::LongitudeShift;

/// One way of turning input fields into RGB frames.
pub trait FrameRecipe: Sync {
    /// Inputs for one time block, already realigned.
    type Block: Sync;

    fn name(&self) -> &'static str;

    /// Canonical timestamps, one per frame candidate.
    fn times(&self) -> &[NaiveDateTime];

    /// Grid every channel is defined on.
    fn grid(&self) -> GridShape;

    /// Load and realign the inputs for `range`.
    fn load_block(&self, range: Range<usize>, shift: &LongitudeShift) -> FrameResult<Self::Block>;

    /// Compose block-relative timestep `j`, or `None` to skip it.
    fn compose(
        &self,
        block: &Self::Block,
        j: usize,
        timestamp: NaiveDateTime,
    ) -> FrameResult<Option<EncodedFrame>>;
}

/// Read a variable's timestamps and check they match its time dimension.
pub(crate) fn timed_shape<D: GridDataset + ?Sized>(
    dataset: &D,
    variable: &str,
) -> FrameResult<(Vec<NaiveDateTime>, FieldShape)> {
    let coordinate = resolve_time_coordinate(dataset)?;
    let times = dataset.read_times(&coordinate)?;
    let shape = dataset.field_shape(variable)?;
    if times.len() != shape.ntime {
        return Err(FrameError::shape_mismatch(format!(
            "{variable} has {} timesteps but {coordinate} has {}",
            shape.ntime,
            times.len()
        )));
    }
    Ok((times, shape))
}

fn load_realigned<D: GridDataset + ?Sized>(
    dataset: &D,
    variable: &str,
    range: Range<usize>,
    shift: &LongitudeShift,
) -> FrameResult<TimeBlock> {
    let mut block = dataset.read_block(variable, range)?;
    shift.apply_block(&mut block)?;
    Ok(block)
}

// ============================================================================
// Anomaly
// ============================================================================

/// Red: total column water. Green: its monthly climatology. Blue: the
/// difference.
///
/// Timesteps in months the climatology does not cover are skipped.
pub struct AnomalyRecipe<'a, D: GridDataset + ?Sized> {
    instant: &'a D,
    variable: String,
    times: Vec<NaiveDateTime>,
    grid: GridShape,
    climatology: &'a ClimatologyTable,
    tcw: ScalingLaw,
    anomaly: ScalingLaw,
}

impl<'a, D: GridDataset + ?Sized> AnomalyRecipe<'a, D> {
    pub fn new(
        instant: &'a D,
        climatology: &'a ClimatologyTable,
        channels: &ChannelScales,
    ) -> FrameResult<Self> {
        let variable = resolve_variable(instant, TOTAL_COLUMN_WATER_ALIASES)?;
        let (times, shape) = timed_shape(instant, &variable)?;
        Self::with_parts(instant, variable, times, shape.grid, climatology, channels)
    }

    /// Build from an already resolved variable and time axis.
    pub fn with_parts(
        instant: &'a D,
        variable: String,
        times: Vec<NaiveDateTime>,
        grid: GridShape,
        climatology: &'a ClimatologyTable,
        channels: &ChannelScales,
    ) -> FrameResult<Self> {
        if climatology.grid() != grid {
            return Err(FrameError::shape_mismatch(format!(
                "climatology grid {}x{} differs from instantaneous grid {}x{}",
                climatology.grid().nlat,
                climatology.grid().nlon,
                grid.nlat,
                grid.nlon
            )));
        }
        Ok(Self {
            instant,
            variable,
            times,
            grid,
            climatology,
            tcw: channels.tcw,
            anomaly: channels.anomaly,
        })
    }
}

impl<D: GridDataset + ?Sized> FrameRecipe for AnomalyRecipe<'_, D> {
    type Block = TimeBlock;

    fn name(&self) -> &'static str {
        "anomaly"
    }

    fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    fn grid(&self) -> GridShape {
        self.grid
    }

    fn load_block(&self, range: Range<usize>, shift: &LongitudeShift) -> FrameResult<TimeBlock> {
        load_realigned(self.instant, &self.variable, range, shift)
    }

    fn compose(
        &self,
        block: &TimeBlock,
        j: usize,
        timestamp: NaiveDateTime,
    ) -> FrameResult<Option<EncodedFrame>> {
        let Some(climatology) = self.climatology.lookup(timestamp.month()) else {
            return Ok(None);
        };

        let instant = block.field(j);
        let mean = climatology.values();
        let anomaly: Vec<f32> = instant.iter().zip(mean).map(|(x, c)| x - c).collect();

        EncodedFrame::from_fields(
            timestamp,
            self.grid,
            [
                (instant, &self.tcw),
                (mean, &self.tcw),
                (anomaly.as_slice(), &self.anomaly),
            ],
        )
        .map(Some)
    }
}

// ============================================================================
// Water budget
// ============================================================================

/// Red: total precipitation. Green: evaporation, `max(-e, 0)`. Blue: total
/// column water.
///
/// The accumulated dataset's time axis is canonical; the instantaneous one
/// must match it step for step.
pub struct WaterBudgetRecipe<'a, A: GridDataset + ?Sized, I: GridDataset + ?Sized> {
    accumulated: &'a A,
    instant: &'a I,
    precipitation: String,
    evaporation: String,
    tcw: String,
    times: Vec<NaiveDateTime>,
    grid: GridShape,
    channels: ChannelScales,
}

/// Realigned inputs of one water-budget block.
pub struct WaterBudgetBlock {
    precipitation: TimeBlock,
    evaporation: TimeBlock,
    tcw: TimeBlock,
}

impl<'a, A, I> WaterBudgetRecipe<'a, A, I>
where
    A: GridDataset + ?Sized,
    I: GridDataset + ?Sized,
{
    pub fn new(accumulated: &'a A, instant: &'a I, channels: &ChannelScales) -> FrameResult<Self> {
        let precipitation = resolve_variable(accumulated, PRECIPITATION_ALIASES)?;
        let evaporation = resolve_variable(accumulated, EVAPORATION_ALIASES)?;
        let tcw = resolve_variable(instant, TOTAL_COLUMN_WATER_ALIASES)?;

        let (times, shape) = timed_shape(accumulated, &precipitation)?;
        let evaporation_shape = accumulated.field_shape(&evaporation)?;
        let tcw_shape = instant.field_shape(&tcw)?;

        for (name, other) in [(&evaporation, evaporation_shape), (&tcw, tcw_shape)] {
            if other != shape {
                return Err(FrameError::shape_mismatch(format!(
                    "{name} is {}x{}x{}, {precipitation} is {}x{}x{}",
                    other.ntime,
                    other.grid.nlat,
                    other.grid.nlon,
                    shape.ntime,
                    shape.grid.nlat,
                    shape.grid.nlon
                )));
            }
        }

        Ok(Self {
            accumulated,
            instant,
            precipitation,
            evaporation,
            tcw,
            times,
            grid: shape.grid,
            channels: *channels,
        })
    }
}

impl<A, I> FrameRecipe for WaterBudgetRecipe<'_, A, I>
where
    A: GridDataset + ?Sized,
    I: GridDataset + ?Sized,
{
    type Block = WaterBudgetBlock;

    fn name(&self) -> &'static str {
        "water-budget"
    }

    fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    fn grid(&self) -> GridShape {
        self.grid
    }

    fn load_block(
        &self,
        range: Range<usize>,
        shift: &LongitudeShift,
    ) -> FrameResult<WaterBudgetBlock> {
        Ok(WaterBudgetBlock {
            precipitation: load_realigned(self.accumulated, &self.precipitation, range.clone(), shift)?,
            evaporation: load_realigned(self.accumulated, &self.evaporation, range.clone(), shift)?,
            tcw: load_realigned(self.instant, &self.tcw, range, shift)?,
        })
    }

    fn compose(
        &self,
        block: &WaterBudgetBlock,
        j: usize,
        timestamp: NaiveDateTime,
    ) -> FrameResult<Option<EncodedFrame>> {
        // Evaporation is stored as a negative upward flux.
        let evaporation: Vec<f32> = block
            .evaporation
            .field(j)
            .iter()
            .map(|&e| if e.is_nan() { e } else { (-e).max(0.0) })
            .collect();

        EncodedFrame::from_fields(
            timestamp,
            self.grid,
            [
                (block.precipitation.field(j), &self.channels.precipitation),
                (evaporation.as_slice(), &self.channels.evaporation),
                (block.tcw.field(j), &self.channels.tcw),
            ],
        )
        .map(Some)
    }
}
