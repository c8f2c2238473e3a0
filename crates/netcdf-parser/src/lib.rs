//! NetCDF reader for gridded reanalysis fields.
//!
//! Opens NetCDF-4 files (ERA5-style single-level fields laid out as
//! `(time, latitude, longitude)`) through the native `netcdf` library and
//! exposes them as a [`moisture_common::GridDataset`].
//!
//! # Implementation Notes
//!
//! - Packed variables are unpacked with `scale_factor`/`add_offset`.
//! - `_FillValue` and `missing_value` samples become `NaN`.
//! - Time coordinates are decoded from their CF `units`/`calendar` attributes.

pub mod error;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{silence_hdf5_errors, NetCdfDataset};
