//! Generators for synthetic reanalysis-like inputs.
//!
//! These produce predictable, verifiable values so tests can assert exact
//! pixels after realignment and encoding.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use moisture_common::{FieldShape, GridShape, MemoryDataset};

/// Build a timestamp, panicking on an invalid date.
pub fn datetime(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day} {hour}h"))
}

/// `n` timestamps starting at `start`, `step_hours` apart.
pub fn hourly_times(start: NaiveDateTime, step_hours: i64, n: usize) -> Vec<NaiveDateTime> {
    (0..n)
        .map(|i| start + Duration::hours(step_hours * i as i64))
        .collect()
}

/// Eastward longitudes `0, 360/n, ..., 360 - 360/n`.
pub fn eastward_longitudes(nlon: usize) -> Vec<f64> {
    let step = 360.0 / nlon.max(1) as f64;
    (0..nlon).map(|i| i as f64 * step).collect()
}

/// North-to-south latitudes from 90 to -90.
pub fn latitudes(nlat: usize) -> Vec<f64> {
    if nlat <= 1 {
        return vec![0.0; nlat];
    }
    let step = 180.0 / (nlat - 1) as f64;
    (0..nlat).map(|i| 90.0 - i as f64 * step).collect()
}

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`, so a realigned grid
/// can be checked column by column.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Total-column-water-like values in kg/m^2.
///
/// Moist near the equator, dry near the poles, with a zonal wave that drifts
/// with the time index `t`. Values stay within roughly 2..72.
pub fn create_tcw_grid(grid: GridShape, t: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(grid.len());
    for row in 0..grid.nlat {
        let lat = if grid.nlat > 1 {
            row as f32 / (grid.nlat - 1) as f32 * 2.0 - 1.0
        } else {
            0.0
        };
        let base = 12.0 + 50.0 * (1.0 - lat * lat);
        for col in 0..grid.nlon {
            let phase = (col + 3 * t) as f32 / grid.nlon.max(1) as f32;
            data.push(base + 10.0 * (phase * std::f32::consts::TAU).sin());
        }
    }
    data
}

/// A dataset with one (time, lat, lon) variable plus `valid_time`,
/// `latitude` and `longitude` coordinates.
///
/// `value(t, lat, lon)` gives each sample.
pub fn synthetic_dataset<F>(
    variable: &str,
    times: Vec<NaiveDateTime>,
    grid: GridShape,
    value: F,
) -> MemoryDataset
where
    F: Fn(usize, usize, usize) -> f32,
{
    let shape = FieldShape {
        ntime: times.len(),
        grid,
    };
    let mut data = Vec::with_capacity(shape.ntime * grid.len());
    for t in 0..shape.ntime {
        for lat in 0..grid.nlat {
            for lon in 0..grid.nlon {
                data.push(value(t, lat, lon));
            }
        }
    }

    MemoryDataset::new()
        .with_times("valid_time", times)
        .with_coordinate("latitude", latitudes(grid.nlat))
        .with_coordinate("longitude", eastward_longitudes(grid.nlon))
        .with_variable(variable, shape, data)
        .expect("synthetic data matches its shape")
}
