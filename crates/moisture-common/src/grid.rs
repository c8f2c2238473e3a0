//! Dense grid storage for (lat, lon) fields and (time, lat, lon) blocks.
//!
//! All data is `f32` in row-major order with longitude varying fastest, which
//! is the on-disk layout of the source datasets.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{FrameError, FrameResult};

/// Horizontal shape of a regular lat/lon grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of latitude rows
    pub nlat: usize,
    /// Number of longitude columns
    pub nlon: usize,
}

impl GridShape {
    pub fn new(nlat: usize, nlon: usize) -> Self {
        Self { nlat, nlon }
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nlat * self.nlon
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nlat == 0 || self.nlon == 0
    }

    /// Get the 1D array index for a (lat, lon) position.
    pub fn flat_index(&self, lat: usize, lon: usize) -> usize {
        lat * self.nlon + lon
    }
}

/// Full shape of a time series variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldShape {
    pub ntime: usize,
    pub grid: GridShape,
}

impl FieldShape {
    pub fn new(ntime: usize, nlat: usize, nlon: usize) -> Self {
        Self {
            ntime,
            grid: GridShape::new(nlat, nlon),
        }
    }
}

/// One physical quantity at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    shape: GridShape,
    data: Vec<f32>,
}

impl GridField {
    /// Wrap row-major data, checking that it matches the shape.
    pub fn new(shape: GridShape, data: Vec<f32>) -> FrameResult<Self> {
        if data.len() != shape.len() {
            return Err(FrameError::shape_mismatch(format!(
                "field of {}x{} needs {} values, got {}",
                shape.nlat,
                shape.nlon,
                shape.len(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// A field filled with a single value.
    pub fn filled(shape: GridShape, value: f32) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn get(&self, lat: usize, lon: usize) -> Option<f32> {
        if lat >= self.shape.nlat || lon >= self.shape.nlon {
            return None;
        }
        Some(self.data[self.shape.flat_index(lat, lon)])
    }

    pub fn into_values(self) -> Vec<f32> {
        self.data
    }
}

/// A contiguous slice of a time series variable, `[start, start + len)` on
/// the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBlock {
    start: usize,
    len: usize,
    grid: GridShape,
    data: Vec<f32>,
}

impl TimeBlock {
    pub fn new(range: Range<usize>, grid: GridShape, data: Vec<f32>) -> FrameResult<Self> {
        let len = range.end.saturating_sub(range.start);
        if data.len() != len * grid.len() {
            return Err(FrameError::shape_mismatch(format!(
                "block of {} steps on {}x{} needs {} values, got {}",
                len,
                grid.nlat,
                grid.nlon,
                len * grid.len(),
                data.len()
            )));
        }
        Ok(Self {
            start: range.start,
            len,
            grid,
            data,
        })
    }

    /// Absolute index of the first timestep in this block.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of timesteps in this block.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    /// The field at block-relative index `j`.
    pub fn field(&self, j: usize) -> &[f32] {
        let n = self.grid.len();
        &self.data[j * n..(j + 1) * n]
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
