//! Per-calendar-month mean fields from a multi-year baseline.
//!
//! The baseline is read block by block and folded into f64 sum/count
//! accumulators, one pair per required month, so memory stays bounded by the
//! block size regardless of how many years the baseline spans. Missing
//! samples are excluded from the mean. Each finished mean is realigned once
//! and stored densely; lookups afterwards never recompute anything.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDateTime};
use moisture_common::{FrameError, FrameResult, GridDataset, GridField, GridShape};
use tracing::{debug, info};

use crate::realign::LongitudeShift;
use crate::streamer::block_ranges;

/// Months needing a climatology: those present in `times`, restricted to
/// `configured` unless it is empty.
pub fn required_months(times: &[NaiveDateTime], configured: &[u32]) -> BTreeSet<u32> {
    times
        .iter()
        .map(|t| t.month())
        .filter(|m| configured.is_empty() || configured.contains(m))
        .collect()
}

/// Immutable month -> mean field lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyTable {
    grid: GridShape,
    fields: BTreeMap<u32, GridField>,
}

impl ClimatologyTable {
    /// Build the table for `required` months from a baseline variable.
    ///
    /// `times` is the decoded time coordinate of the baseline and `grid` the
    /// grid of the instantaneous series the table will be matched against; a
    /// baseline on any other grid is refused before it is read. A required
    /// month without a single baseline timestep fails with
    /// [`FrameError::ClimatologyCoverage`].
    pub fn build<D: GridDataset + ?Sized>(
        baseline: &D,
        variable: &str,
        times: &[NaiveDateTime],
        required: &BTreeSet<u32>,
        grid: GridShape,
        shift: LongitudeShift,
        block_size: usize,
    ) -> FrameResult<Self> {
        let shape = baseline.field_shape(variable)?;
        if times.len() != shape.ntime {
            return Err(FrameError::shape_mismatch(format!(
                "baseline {variable} has {} timesteps but {} timestamps",
                shape.ntime,
                times.len()
            )));
        }
        if shape.grid != grid {
            return Err(FrameError::shape_mismatch(format!(
                "baseline grid {}x{} differs from instantaneous grid {}x{}",
                shape.grid.nlat,
                shape.grid.nlon,
                grid.nlat,
                grid.nlon
            )));
        }
        shift.check(grid)?;

        let mut accumulators: BTreeMap<u32, MonthAccumulator> = required
            .iter()
            .map(|&m| (m, MonthAccumulator::new(grid.len())))
            .collect();

        for range in block_ranges(shape.ntime, block_size) {
            let wanted = times[range.clone()]
                .iter()
                .any(|t| accumulators.contains_key(&t.month()));
            if !wanted {
                continue;
            }

            let block = baseline.read_block(variable, range.clone())?;
            for (j, t) in times[range.clone()].iter().enumerate() {
                if let Some(acc) = accumulators.get_mut(&t.month()) {
                    acc.add(block.field(j));
                }
            }
            debug!(start = range.start, end = range.end, "Accumulated baseline block");
        }

        let mut fields = BTreeMap::new();
        for (month, acc) in accumulators {
            if acc.samples == 0 {
                return Err(FrameError::ClimatologyCoverage { month });
            }
            let samples = acc.samples;
            let mut field = GridField::new(grid, acc.mean())?;
            shift.apply_field(&mut field)?;
            info!(month, samples, "Built monthly climatology");
            fields.insert(month, field);
        }

        Ok(Self { grid, fields })
    }

    /// Wrap already-realigned monthly fields.
    pub fn from_fields(grid: GridShape, fields: BTreeMap<u32, GridField>) -> FrameResult<Self> {
        if let Some((month, f)) = fields.iter().find(|(_, f)| f.shape() != grid) {
            return Err(FrameError::shape_mismatch(format!(
                "climatology for month {month} is {}x{}, expected {}x{}",
                f.shape().nlat,
                f.shape().nlon,
                grid.nlat,
                grid.nlon
            )));
        }
        Ok(Self { grid, fields })
    }

    /// Mean field for a calendar month, if the table covers it.
    pub fn lookup(&self, month: u32) -> Option<&GridField> {
        self.fields.get(&month)
    }

    /// Covered months in ascending order.
    pub fn months(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Running skip-NaN sum for one month.
struct MonthAccumulator {
    sum: Vec<f64>,
    count: Vec<u32>,
    samples: usize,
}

impl MonthAccumulator {
    fn new(n: usize) -> Self {
        Self {
            sum: vec![0.0; n],
            count: vec![0; n],
            samples: 0,
        }
    }

    fn add(&mut self, field: &[f32]) {
        for ((s, c), &v) in self.sum.iter_mut().zip(self.count.iter_mut()).zip(field) {
            if !v.is_nan() {
                *s += v as f64;
                *c += 1;
            }
        }
        self.samples += 1;
    }

    /// Cells with no valid sample stay NaN.
    fn mean(self) -> Vec<f32> {
        self.sum
            .iter()
            .zip(&self.count)
            .map(|(&s, &c)| if c == 0 { f32::NAN } else { (s / c as f64) as f32 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use moisture_common::{FieldShape, MemoryDataset};
    use test_utils::assert_fields_approx_eq;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// 1x2 grid: Nov 2019, Nov 2020, Dec 2020, Jun 2020.
    fn baseline() -> (MemoryDataset, Vec<NaiveDateTime>) {
        let times = vec![at(2019, 11, 1), at(2020, 6, 1), at(2020, 11, 1), at(2020, 12, 1)];
        let data = vec![
            10.0, 20.0, // 2019-11
            99.0, 99.0, // 2020-06
            30.0, f32::NAN, // 2020-11
            5.0, 7.0, // 2020-12
        ];
        let ds = MemoryDataset::new()
            .with_times("time", times.clone())
            .with_variable("tcw", FieldShape::new(4, 1, 2), data)
            .unwrap();
        (ds, times)
    }

    #[test]
    fn test_required_months() {
        let times = vec![at(2021, 10, 1), at(2021, 11, 1), at(2021, 12, 1), at(2022, 1, 1)];
        assert_eq!(required_months(&times, &[11, 12]), BTreeSet::from([11, 12]));
        assert_eq!(required_months(&times, &[]), BTreeSet::from([1, 10, 11, 12]));
        assert!(required_months(&times, &[6]).is_empty());
    }

    #[test]
    fn test_skip_nan_mean_and_realignment() {
        let (ds, times) = baseline();
        let grid = GridShape::new(1, 2);
        let shift = LongitudeShift::from_grid(grid);
        for block_size in [1, 2, 4, 183] {
            let table =
                ClimatologyTable::build(&ds, "tcw", &times, &BTreeSet::from([11, 12]), grid, shift, block_size)
                    .unwrap();
            assert_eq!(table.months().collect::<Vec<_>>(), vec![11, 12]);
            // (10 + 30) / 2 = 20 at lon 0, 20 alone at lon 1; then swapped.
            assert_fields_approx_eq!(table.lookup(11).unwrap().values(), [20.0, 20.0], 1e-6);
            assert_fields_approx_eq!(table.lookup(12).unwrap().values(), [7.0, 5.0], 1e-6);
            assert!(table.lookup(6).is_none());
        }
    }

    #[test]
    fn test_lookup_is_stable() {
        let (ds, times) = baseline();
        let grid = GridShape::new(1, 2);
        let shift = LongitudeShift::from_grid(grid);
        let table =
            ClimatologyTable::build(&ds, "tcw", &times, &BTreeSet::from([11]), grid, shift, 2).unwrap();
        let first = table.lookup(11).unwrap() as *const GridField;
        let second = table.lookup(11).unwrap() as *const GridField;
        assert_eq!(first, second);
        assert_eq!(
            table.lookup(11).unwrap().values().iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            table.lookup(11).unwrap().values().iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_missing_month_is_fatal() {
        let (ds, times) = baseline();
        let grid = GridShape::new(1, 2);
        let shift = LongitudeShift::from_grid(grid);
        let err = ClimatologyTable::build(&ds, "tcw", &times, &BTreeSet::from([1, 11]), grid, shift, 4)
            .unwrap_err();
        assert!(matches!(err, FrameError::ClimatologyCoverage { month: 1 }));
    }

    #[test]
    fn test_all_nan_cell_stays_nan() {
        let times = vec![at(2020, 11, 1), at(2021, 11, 1)];
        let ds = MemoryDataset::new()
            .with_times("time", times.clone())
            .with_variable("tcw", FieldShape::new(2, 1, 1), vec![f32::NAN, f32::NAN])
            .unwrap();
        let grid = GridShape::new(1, 1);
        let shift = LongitudeShift::from_grid(grid);
        let table =
            ClimatologyTable::build(&ds, "tcw", &times, &BTreeSet::from([11]), grid, shift, 10).unwrap();
        assert!(table.lookup(11).unwrap().values()[0].is_nan());
    }

    #[test]
    fn test_skips_blocks_without_required_months() {
        let (ds, times) = baseline();
        let grid = GridShape::new(1, 2);
        let shift = LongitudeShift::from_grid(grid);
        ClimatologyTable::build(&ds, "tcw", &times, &BTreeSet::from([6]), grid, shift, 1).unwrap();
        assert_eq!(ds.block_reads(), 1);
    }

    #[test]
    fn test_rejects_mismatched_grid_before_reading() {
        let (ds, times) = baseline();
        for grid in [GridShape::new(1, 4), GridShape::new(3, 2)] {
            let shift = LongitudeShift::from_grid(grid);
            let err = ClimatologyTable::build(&ds, "tcw", &times, &BTreeSet::from([11]), grid, shift, 4)
                .unwrap_err();
            assert!(matches!(err, FrameError::ShapeMismatch(_)), "grid {grid:?}");
        }
        assert_eq!(ds.block_reads(), 0);
    }
}
