//! In-memory dataset, used for synthetic inputs and tests.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dataset::GridDataset;
use crate::error::{FrameError, FrameResult};
use crate::grid::{FieldShape, TimeBlock};

/// A dataset whose coordinates and variables live in plain vectors.
#[derive(Debug, Default)]
pub struct MemoryDataset {
    times: BTreeMap<String, Vec<NaiveDateTime>>,
    coordinates: BTreeMap<String, Vec<f64>>,
    variables: BTreeMap<String, (FieldShape, Vec<f32>)>,
    block_reads: AtomicUsize,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a time coordinate.
    pub fn with_times(mut self, name: &str, times: Vec<NaiveDateTime>) -> Self {
        self.times.insert(name.to_string(), times);
        self
    }

    /// Add a numeric 1-D coordinate (e.g. longitude).
    pub fn with_coordinate(mut self, name: &str, values: Vec<f64>) -> Self {
        self.coordinates.insert(name.to_string(), values);
        self
    }

    /// Add a (time, lat, lon) variable in row-major order.
    pub fn with_variable(
        mut self,
        name: &str,
        shape: FieldShape,
        data: Vec<f32>,
    ) -> FrameResult<Self> {
        let expected = shape.ntime * shape.grid.len();
        if data.len() != expected {
            return Err(FrameError::shape_mismatch(format!(
                "variable {name} needs {expected} values, got {}",
                data.len()
            )));
        }
        self.variables.insert(name.to_string(), (shape, data));
        Ok(self)
    }

    /// Number of `read_block` calls served so far.
    pub fn block_reads(&self) -> usize {
        self.block_reads.load(Ordering::Relaxed)
    }

    fn variable(&self, name: &str) -> FrameResult<&(FieldShape, Vec<f32>)> {
        self.variables
            .get(name)
            .ok_or_else(|| FrameError::data_read(format!("no variable named {name}")))
    }
}

impl GridDataset for MemoryDataset {
    fn coordinate_names(&self) -> Vec<String> {
        self.times
            .keys()
            .chain(self.coordinates.keys())
            .cloned()
            .collect()
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn field_shape(&self, variable: &str) -> FrameResult<FieldShape> {
        Ok(self.variable(variable)?.0)
    }

    fn read_times(&self, coordinate: &str) -> FrameResult<Vec<NaiveDateTime>> {
        self.times
            .get(coordinate)
            .cloned()
            .ok_or_else(|| FrameError::data_read(format!("no time coordinate named {coordinate}")))
    }

    fn read_coordinate(&self, coordinate: &str) -> FrameResult<Option<Vec<f64>>> {
        Ok(self.coordinates.get(coordinate).cloned())
    }

    fn read_block(&self, variable: &str, range: Range<usize>) -> FrameResult<TimeBlock> {
        let (shape, data) = self.variable(variable)?;
        if range.start > range.end || range.end > shape.ntime {
            return Err(FrameError::data_read(format!(
                "time range {range:?} outside 0..{} for {variable}",
                shape.ntime
            )));
        }
        self.block_reads.fetch_add(1, Ordering::Relaxed);

        let n = shape.grid.len();
        let slice = data[range.start * n..range.end * n].to_vec();
        TimeBlock::new(range, shape.grid, slice)
    }
}
