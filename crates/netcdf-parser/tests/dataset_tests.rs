//! Integration tests reading small NetCDF files written on the fly.
//!
//! Requires libnetcdf at test time (same as the crate itself).

use chrono::{Datelike, Timelike};
use moisture_common::{
    resolve_time_coordinate, resolve_variable, FrameError, GridDataset, TOTAL_COLUMN_WATER_ALIASES,
};
use netcdf_parser::NetCdfDataset;
use std::path::Path;

/// Write a 3-step, 2x4 ERA5-style file with a packed `tcw` variable.
fn write_era5_like(path: &Path) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("valid_time", 3)?;
    file.add_dimension("latitude", 2)?;
    file.add_dimension("longitude", 4)?;

    {
        let mut time = file.add_variable::<i64>("valid_time", &["valid_time"])?;
        time.put_attribute("units", "seconds since 1970-01-01")?;
        time.put_attribute("calendar", "proleptic_gregorian")?;
        // 2021-11-01T00, 2021-11-01T06, 2021-12-01T00
        time.put_values(&[1_635_724_800i64, 1_635_746_400, 1_638_316_800], ..)?;
    }
    {
        let mut lat = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat.put_values(&[45.0, -45.0], ..)?;
    }
    {
        let mut lon = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon.put_values(&[0.0, 90.0, 180.0, 270.0], ..)?;
    }
    {
        let mut tcw = file.add_variable::<i16>("tcw", &["valid_time", "latitude", "longitude"])?;
        tcw.put_attribute("scale_factor", 0.5f64)?;
        tcw.put_attribute("add_offset", 10.0f64)?;
        tcw.put_attribute("missing_value", -32767i16)?;
        let raw: Vec<i16> = (0..24).map(|i| if i == 5 { -32767 } else { i as i16 }).collect();
        tcw.put_values(&raw, ..)?;
    }
    {
        let mut flat = file.add_variable::<f32>("lsm", &["latitude", "longitude"])?;
        flat.put_values(&[0.0f32; 8], ..)?;
    }

    Ok(())
}

#[test]
fn test_classifies_coordinates_and_variables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instant.nc");
    write_era5_like(&path).unwrap();

    let ds = NetCdfDataset::open(&path).unwrap();
    let coords = ds.coordinate_names();
    assert!(coords.contains(&"valid_time".to_string()));
    assert!(coords.contains(&"longitude".to_string()));
    assert!(ds.variable_names().contains(&"tcw".to_string()));

    assert_eq!(resolve_time_coordinate(&ds).unwrap(), "valid_time");
    assert_eq!(resolve_variable(&ds, TOTAL_COLUMN_WATER_ALIASES).unwrap(), "tcw");
}

#[test]
fn test_reads_cf_times() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instant.nc");
    write_era5_like(&path).unwrap();

    let ds = NetCdfDataset::open(&path).unwrap();
    let times = ds.read_times("valid_time").unwrap();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1].hour(), 6);
    assert_eq!(times[2].month(), 12);
}

#[test]
fn test_read_block_unpacks_and_masks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instant.nc");
    write_era5_like(&path).unwrap();

    let ds = NetCdfDataset::open(&path).unwrap();
    let shape = ds.field_shape("tcw").unwrap();
    assert_eq!(shape.ntime, 3);
    assert_eq!(shape.grid.nlat, 2);
    assert_eq!(shape.grid.nlon, 4);

    let block = ds.read_block("tcw", 0..2).unwrap();
    assert_eq!(block.len(), 2);
    assert_eq!(block.field(0)[0], 10.0);
    assert_eq!(block.field(0)[1], 10.5);
    assert!(block.field(0)[5].is_nan());

    let tail = ds.read_block("tcw", 2..3).unwrap();
    assert_eq!(tail.start(), 2);
    // raw 16 -> 16 * 0.5 + 10
    assert_eq!(tail.field(0)[0], 18.0);
}

#[test]
fn test_two_dimensional_variable_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instant.nc");
    write_era5_like(&path).unwrap();

    let ds = NetCdfDataset::open(&path).unwrap();
    let err = ds.field_shape("lsm").unwrap_err();
    assert!(matches!(err, FrameError::ShapeMismatch(_)));
}

#[test]
fn test_reads_longitude_coordinate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instant.nc");
    write_era5_like(&path).unwrap();

    let ds = NetCdfDataset::open(&path).unwrap();
    let lon = ds.read_coordinate("longitude").unwrap().unwrap();
    assert_eq!(lon, vec![0.0, 90.0, 180.0, 270.0]);
    assert!(ds.read_coordinate("nope").unwrap().is_none());
}

/// Reads a real ERA5 download when one is available locally.
#[test]
fn test_real_era5_total_column_water() {
    let path = test_utils::require_test_file!("era5_tcw_sample.nc");
    let ds = NetCdfDataset::open(&path).unwrap();

    let variable = resolve_variable(&ds, TOTAL_COLUMN_WATER_ALIASES).unwrap();
    let times = ds.read_times(&resolve_time_coordinate(&ds).unwrap()).unwrap();
    let shape = ds.field_shape(&variable).unwrap();
    assert_eq!(times.len(), shape.ntime);
    assert!(times.windows(2).all(|w| w[0] < w[1]));

    let block = ds.read_block(&variable, 0..shape.ntime.min(2)).unwrap();
    assert!(block
        .values()
        .iter()
        .filter(|v| !v.is_nan())
        .all(|v| (0.0..200.0).contains(v)));
}
