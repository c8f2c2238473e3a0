//! Native NetCDF access using the netcdf library.
//!
//! The netcdf library wraps libnetcdf/HDF5 and is not re-entrant per handle,
//! so each [`NetCdfDataset`] serializes access to its file behind a mutex.
//! Reads are issued per time block, which matches how reanalysis downloads
//! are chunked on disk.

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, Once};

use chrono::NaiveDateTime;
use moisture_common::{
    decode_cf_times, FieldShape, FrameError, FrameResult, GridDataset, TimeBlock, LATITUDE_ALIASES,
    LONGITUDE_ALIASES,
};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// It only needs to be called once per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open NetCDF file exposing (time, latitude, longitude) variables.
pub struct NetCdfDataset {
    path: PathBuf,
    file: Mutex<netcdf::File>,
    coordinates: Vec<String>,
    variables: Vec<String>,
}

impl std::fmt::Debug for NetCdfDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfDataset")
            .field("path", &self.path)
            .field("coordinates", &self.coordinates)
            .field("variables", &self.variables)
            .finish()
    }
}

impl NetCdfDataset {
    /// Open a NetCDF file and catalogue its coordinates and data variables.
    pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(NetCdfError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let file = netcdf::open(&path)?;
        let (coordinates, variables) = classify_variables(&file);

        info!(
            path = %path.display(),
            coordinates = ?coordinates,
            variables = ?variables,
            "Opened NetCDF dataset"
        );

        Ok(Self {
            path,
            file: Mutex::new(file),
            coordinates,
            variables,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn handle(&self) -> FrameResult<MutexGuard<'_, netcdf::File>> {
        self.file
            .lock()
            .map_err(|_| FrameError::data_read(format!("{} handle poisoned", self.path.display())))
    }
}

impl GridDataset for NetCdfDataset {
    fn coordinate_names(&self) -> Vec<String> {
        self.coordinates.clone()
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.clone()
    }

    fn field_shape(&self, variable: &str) -> FrameResult<FieldShape> {
        let file = self.handle()?;
        let var = file
            .variable(variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("{variable} variable")))?;

        let dims = var.dimensions();
        if dims.len() != 3 {
            return Err(FrameError::shape_mismatch(format!(
                "{variable} has {} dimensions, expected (time, latitude, longitude)",
                dims.len()
            )));
        }

        let lat_name = dims[1].name();
        let lon_name = dims[2].name();
        if !LATITUDE_ALIASES.contains(&lat_name.as_str())
            || !LONGITUDE_ALIASES.contains(&lon_name.as_str())
        {
            return Err(FrameError::shape_mismatch(format!(
                "{variable} is laid out as ({}, {lat_name}, {lon_name}), expected (time, latitude, longitude)",
                dims[0].name()
            )));
        }

        Ok(FieldShape::new(dims[0].len(), dims[1].len(), dims[2].len()))
    }

    fn read_times(&self, coordinate: &str) -> FrameResult<Vec<NaiveDateTime>> {
        let file = self.handle()?;
        let var = file
            .variable(coordinate)
            .ok_or_else(|| NetCdfError::MissingData(format!("{coordinate} coordinate")))?;

        let raw: Vec<f64> = var.get_values(..).map_err(NetCdfError::from)?;
        let units = get_str_attr(&var, "units")
            .ok_or_else(|| NetCdfError::MissingData(format!("units attribute on {coordinate}")))?;
        let calendar = get_str_attr(&var, "calendar");

        debug!(coordinate, units = %units, count = raw.len(), "Decoding time coordinate");
        decode_cf_times(&raw, &units, calendar.as_deref())
    }

    fn read_coordinate(&self, coordinate: &str) -> FrameResult<Option<Vec<f64>>> {
        let file = self.handle()?;
        let Some(var) = file.variable(coordinate) else {
            return Ok(None);
        };
        if var.dimensions().len() != 1 {
            return Ok(None);
        }
        let values: Vec<f64> = var.get_values(..).map_err(NetCdfError::from)?;
        Ok(Some(values))
    }

    fn read_block(&self, variable: &str, range: Range<usize>) -> FrameResult<TimeBlock> {
        let shape = self.field_shape(variable)?;
        if range.start > range.end || range.end > shape.ntime {
            return Err(FrameError::data_read(format!(
                "time range {range:?} outside 0..{} for {variable}",
                shape.ntime
            )));
        }

        let file = self.handle()?;
        let var = file
            .variable(variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("{variable} variable")))?;

        let mut data: Vec<f32> = var
            .get_values((range.start..range.end, .., ..))
            .map_err(NetCdfError::from)?;

        let packing = Packing::from_variable(&var);
        packing.unpack(&mut data);

        TimeBlock::new(range, shape.grid, data)
    }
}

/// Packing and missing-value attributes of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Packing {
    scale_factor: f32,
    add_offset: f32,
    fill_value: Option<f32>,
    missing_value: Option<f32>,
}

impl Packing {
    fn from_variable(var: &netcdf::Variable) -> Self {
        Self {
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0) as f32,
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0) as f32,
            fill_value: get_f64_attr(var, "_FillValue").map(|v| v as f32),
            missing_value: get_f64_attr(var, "missing_value").map(|v| v as f32),
        }
    }

    /// Replace sentinel samples with NaN and apply scale/offset to the rest.
    fn unpack(&self, data: &mut [f32]) {
        let identity = self.scale_factor == 1.0 && self.add_offset == 0.0;
        for v in data.iter_mut() {
            if Some(*v) == self.fill_value || Some(*v) == self.missing_value {
                *v = f32::NAN;
            } else if !identity {
                *v = *v * self.scale_factor + self.add_offset;
            }
        }
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Split variables into coordinates and data variables.
///
/// A coordinate is a variable named after a dimension, or one listed in
/// another variable's `coordinates` attribute.
fn classify_variables(file: &netcdf::File) -> (Vec<String>, Vec<String>) {
    let dimension_names: BTreeSet<String> = file.dimensions().map(|d| d.name()).collect();

    let mut coordinate_set: BTreeSet<String> = BTreeSet::new();
    for var in file.variables() {
        let name = var.name();
        if dimension_names.contains(&name) {
            coordinate_set.insert(name);
        }
        if let Some(listed) = get_str_attr(&var, "coordinates") {
            coordinate_set.extend(listed.split_whitespace().map(str::to_string));
        }
    }

    let mut coordinates = Vec::new();
    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if coordinate_set.contains(&name) {
            coordinates.push(name);
        } else {
            variables.push(name);
        }
    }
    (coordinates, variables)
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute widened to f64.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
