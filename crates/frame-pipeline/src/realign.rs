//! Longitude realignment from 0..360 to -180..180.
//!
//! Each latitude row is rotated left by `half = nlon / 2` columns. The shift
//! is computed once from the canonical grid and reused for every field that
//! will be combined with it, so instantaneous and climatological fields can
//! never disagree on where a column lands.

use moisture_common::{
    resolve_first, FrameError, FrameResult, GridDataset, GridField, GridShape, TimeBlock,
    LONGITUDE_ALIASES,
};
use tracing::warn;

/// A fixed cyclic shift of the longitude axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongitudeShift {
    half: usize,
    nlon: usize,
}

impl LongitudeShift {
    /// Derive the shift from the canonical grid.
    pub fn from_grid(grid: GridShape) -> Self {
        Self {
            half: grid.nlon / 2,
            nlon: grid.nlon,
        }
    }

    /// Columns moved from the front of each row to the back.
    pub fn half(&self) -> usize {
        self.half
    }

    /// Longitude count the shift was derived for.
    pub fn nlon(&self) -> usize {
        self.nlon
    }

    /// Realign a single field in place.
    pub fn apply_field(&self, field: &mut GridField) -> FrameResult<()> {
        self.check(field.shape())?;
        self.rotate_rows(field.values_mut(), true);
        Ok(())
    }

    /// Realign every timestep of a block in place.
    pub fn apply_block(&self, block: &mut TimeBlock) -> FrameResult<()> {
        self.check(block.grid())?;
        self.rotate_rows(block.values_mut(), true);
        Ok(())
    }

    /// Undo [`apply_field`](Self::apply_field).
    pub fn invert_field(&self, field: &mut GridField) -> FrameResult<()> {
        self.check(field.shape())?;
        self.rotate_rows(field.values_mut(), false);
        Ok(())
    }

    /// Refuse a grid whose width differs from the one the shift was derived for.
    pub fn check(&self, grid: GridShape) -> FrameResult<()> {
        if grid.nlon != self.nlon {
            return Err(FrameError::shape_mismatch(format!(
                "longitude shift derived for {} columns applied to a grid of {}",
                self.nlon, grid.nlon
            )));
        }
        Ok(())
    }

    fn rotate_rows(&self, values: &mut [f32], forward: bool) {
        if self.nlon == 0 || self.half == 0 {
            return;
        }
        for row in values.chunks_exact_mut(self.nlon) {
            if forward {
                row.rotate_left(self.half);
            } else {
                row.rotate_right(self.half);
            }
        }
    }
}

/// Warn when a dataset's longitude axis already starts west of Greenwich.
///
/// `role` names the input in the log line. Returns whether the warning fired;
/// the shift is still applied afterwards, this only flags inputs that were
/// probably centered upstream.
pub fn check_longitude_axis<D: GridDataset + ?Sized>(role: &str, dataset: &D) -> FrameResult<bool> {
    let names = dataset.coordinate_names();
    let Ok(name) = resolve_first("longitude coordinate", LONGITUDE_ALIASES, &names) else {
        return Ok(false);
    };

    let first = dataset
        .read_coordinate(&name)?
        .and_then(|values| values.first().copied());
    match first {
        Some(first) if first < 0.0 => {
            warn!(
                dataset = %role,
                coordinate = %name,
                first,
                "Longitude axis already starts below 0; realignment may double-shift"
            );
            Ok(true)
        }
        _ => Ok(false),
    }
}
