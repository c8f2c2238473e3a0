//! Common types shared across the moisture frame workspace.
//!
//! - [`grid`]: dense (lat, lon) fields and contiguous time blocks
//! - [`dataset`]: the accessor trait every input container implements, plus
//!   alias-based schema resolution
//! - [`time`]: CF time decoding and frame file naming
//! - [`error`]: the fatal/recoverable error taxonomy

pub mod dataset;
pub mod error;
pub mod grid;
pub mod memory;
pub mod time;

pub use dataset::{
    resolve_first, resolve_time_coordinate, resolve_variable, GridDataset, EVAPORATION_ALIASES,
    LATITUDE_ALIASES, LONGITUDE_ALIASES, PRECIPITATION_ALIASES, TIME_ALIASES, TOTAL_COLUMN_WATER_ALIASES,
};
pub use error::{FrameError, FrameResult};
pub use grid::{FieldShape, GridField, GridShape, TimeBlock};
pub use memory::MemoryDataset;
pub use time::{decode_cf_times, frame_file_name, frame_stem, CfTimeUnits};
