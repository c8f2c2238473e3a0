//! Dataset accessor abstraction.
//!
//! Source files drift in naming across providers and download vintages
//! (`valid_time` vs `time`, `tcw` vs `total_column_water`). Each semantic
//! quantity is therefore looked up through an ordered alias list and the
//! first name present wins.

use chrono::NaiveDateTime;
use std::ops::Range;

use crate::error::{FrameError, FrameResult};
use crate::grid::{FieldShape, TimeBlock};

/// Accepted names for the time coordinate, in priority order.
pub const TIME_ALIASES: &[&str] = &["valid_time", "time", "datetime", "date"];

/// Accepted names for total column water.
pub const TOTAL_COLUMN_WATER_ALIASES: &[&str] = &["tcw", "TCW", "tcolw", "total_column_water"];

/// Accepted names for total precipitation.
pub const PRECIPITATION_ALIASES: &[&str] = &["tp", "TP", "precip", "total_precipitation"];

/// Accepted names for evaporation.
pub const EVAPORATION_ALIASES: &[&str] = &["e", "E", "evap", "evaporation"];

/// Accepted names for the latitude axis.
pub const LATITUDE_ALIASES: &[&str] = &["latitude", "lat"];

/// Accepted names for the longitude axis.
pub const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon"];

/// Read access to a gridded (time, latitude, longitude) dataset.
///
/// Implementations own the underlying container for their lifetime; callers
/// only ever borrow contiguous time slices through [`GridDataset::read_block`].
pub trait GridDataset: Send + Sync {
    /// Names of coordinate variables.
    fn coordinate_names(&self) -> Vec<String>;

    /// Names of data variables.
    fn variable_names(&self) -> Vec<String>;

    /// Shape of a (time, lat, lon) data variable.
    fn field_shape(&self, variable: &str) -> FrameResult<FieldShape>;

    /// Decoded values of a time coordinate.
    fn read_times(&self, coordinate: &str) -> FrameResult<Vec<NaiveDateTime>>;

    /// Values of a 1-D coordinate, if present.
    fn read_coordinate(&self, coordinate: &str) -> FrameResult<Option<Vec<f64>>>;

    /// Load timesteps `range` of a data variable into memory.
    fn read_block(&self, variable: &str, range: Range<usize>) -> FrameResult<TimeBlock>;
}

/// Return the first candidate present in `available`.
///
/// Fails with [`FrameError::SchemaResolution`] naming every candidate tried
/// and everything that was actually there.
pub fn resolve_first(
    kind: &'static str,
    candidates: &[&str],
    available: &[String],
) -> FrameResult<String> {
    candidates
        .iter()
        .find(|c| available.iter().any(|a| a == *c))
        .map(|c| c.to_string())
        .ok_or_else(|| FrameError::SchemaResolution {
            kind,
            tried: candidates.iter().map(|c| c.to_string()).collect(),
            available: available.to_vec(),
        })
}

/// Name of the dataset's time coordinate.
pub fn resolve_time_coordinate<D: GridDataset + ?Sized>(dataset: &D) -> FrameResult<String> {
    resolve_first("time coordinate", TIME_ALIASES, &dataset.coordinate_names())
}

/// Name of the first data variable matching `aliases`.
pub fn resolve_variable<D: GridDataset + ?Sized>(
    dataset: &D,
    aliases: &[&str],
) -> FrameResult<String> {
    resolve_first("data variable", aliases, &dataset.variable_names())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_first_respects_priority_order() {
        let available = names(&["time", "valid_time", "latitude"]);
        let hit = resolve_first("time coordinate", TIME_ALIASES, &available).unwrap();
        assert_eq!(hit, "valid_time");
    }

    #[test]
    fn test_resolve_first_falls_back_to_later_alias() {
        let available = names(&["date", "latitude", "longitude"]);
        let hit = resolve_first("time coordinate", TIME_ALIASES, &available).unwrap();
        assert_eq!(hit, "date");
    }

    #[test]
    fn test_resolve_first_reports_tried_and_available() {
        let available = names(&["sst", "msl"]);
        let err = resolve_first("data variable", TOTAL_COLUMN_WATER_ALIASES, &available).unwrap_err();
        match err {
            FrameError::SchemaResolution {
                kind,
                tried,
                available,
            } => {
                assert_eq!(kind, "data variable");
                assert_eq!(tried.len(), TOTAL_COLUMN_WATER_ALIASES.len());
                assert_eq!(available, vec!["sst".to_string(), "msl".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let available = names(&["TCW"]);
        let hit = resolve_first("data variable", TOTAL_COLUMN_WATER_ALIASES, &available).unwrap();
        assert_eq!(hit, "TCW");
    }
}
