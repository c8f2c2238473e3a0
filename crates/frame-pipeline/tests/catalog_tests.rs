//! Tests for hourly frame lookup against a real directory.

use std::fs;
use std::path::Path;

use frame_pipeline::{run_anomaly, CatalogError, FrameCatalog, PipelineConfig, PngDirectorySink};
use moisture_common::{FieldShape, GridShape, MemoryDataset};
use test_utils::{datetime, hourly_times, synthetic_dataset, temp_frame_dir};

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

fn populated() -> tempfile::TempDir {
    let dir = temp_frame_dir();
    for name in [
        "2021-11-01T00-00-00.png",
        "2021-11-01T06-00-00.png",
        "2021-11-01T12-00-00.png",
        "notes.txt",
        "latest.png",
    ] {
        touch(dir.path(), name);
    }
    dir
}

#[test]
fn test_lookup_snaps_minutes() {
    let dir = populated();
    let catalog = FrameCatalog::new(dir.path());
    let path = catalog.lookup("2021-11-01T06:45").unwrap();
    assert_eq!(path, dir.path().join("2021-11-01T06-00-00.png"));
}

#[test]
fn test_range_ignores_unrelated_files() {
    let dir = populated();
    let (first, last) = FrameCatalog::new(dir.path()).range().unwrap();
    assert_eq!(first, "2021-11-01T00-00-00.png");
    assert_eq!(last, "2021-11-01T12-00-00.png");
}

#[test]
fn test_gap_inside_range_is_missing() {
    let dir = populated();
    let err = FrameCatalog::new(dir.path()).lookup("2021-11-01T03:00").unwrap_err();
    assert!(matches!(err, CatalogError::Missing(name) if name == "2021-11-01T03-00-00.png"));
}

#[test]
fn test_outside_range() {
    let dir = populated();
    let catalog = FrameCatalog::new(dir.path());
    for datehour in ["2021-10-31T23:00", "2021-11-01T13:00"] {
        let err = catalog.lookup(datehour).unwrap_err();
        assert!(matches!(err, CatalogError::OutOfRange { .. }), "{datehour}");
    }
}

#[test]
fn test_empty_directory() {
    let dir = temp_frame_dir();
    touch(dir.path(), "README.md");
    let err = FrameCatalog::new(dir.path()).lookup("2021-11-01T00:00").unwrap_err();
    assert!(matches!(err, CatalogError::EmptyDirectory(_)));
}

#[test]
fn test_invalid_datehour_checked_first() {
    let dir = temp_frame_dir();
    let err = FrameCatalog::new(dir.path()).lookup("2021-11-01 00:00").unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDatehour(_)));
}

#[test]
fn test_finds_frames_written_by_pipeline() {
    let grid = GridShape::new(1, 2);
    let instant = synthetic_dataset(
        "tcw",
        hourly_times(datetime(2021, 11, 30, 12), 6, 4),
        grid,
        |t, _, _| 20.0 + t as f32,
    );
    let baseline = MemoryDataset::new()
        .with_times("time", vec![datetime(2020, 11, 1, 0), datetime(2020, 12, 1, 0)])
        .with_variable("tcw", FieldShape::new(2, 1, 2), vec![18.0, 19.0, 21.0, 22.0])
        .unwrap();

    let out = temp_frame_dir();
    let sink = PngDirectorySink::create(out.path()).unwrap();
    run_anomaly(&PipelineConfig::default(), &instant, &baseline, &sink).unwrap();

    let catalog = FrameCatalog::new(out.path());
    assert_eq!(
        catalog.range().unwrap(),
        (
            "2021-11-30T12-00-00.png".to_string(),
            "2021-12-01T06-00-00.png".to_string()
        )
    );
    assert!(catalog.lookup("2021-12-01T00:59").is_ok());
}
