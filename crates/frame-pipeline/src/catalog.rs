//! Lookup of rendered frames by hour.
//!
//! Frames are addressed by a UTC "datehour" `YYYY-MM-DDTHH:mm`. Minutes are
//! dropped and the request is matched against `YYYY-MM-DDTHH-00-00.png`.
//! The available range is the first and last frame name in lexicographic
//! order, which for this naming scheme is also chronological order.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

const DATEHOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid datehour '{0}', expected YYYY-MM-DDTHH:mm")]
    InvalidDatehour(String),

    #[error("Frame {requested} is outside the available range {first} .. {last}")]
    OutOfRange {
        requested: String,
        first: String,
        last: String,
    },

    #[error("Frame {0} is not available")]
    Missing(String),

    #[error("No frames found in {0}")]
    EmptyDirectory(PathBuf),

    #[error("Failed to scan frame directory: {0}")]
    Scan(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A directory of `<timestamp>.png` frames.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    dir: PathBuf,
}

impl FrameCatalog {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frame names in the directory, sorted.
    pub fn frame_names(&self) -> Result<Vec<String>, CatalogError> {
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_frame_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// First and last frame names.
    pub fn range(&self) -> Result<(String, String), CatalogError> {
        let names = self.frame_names()?;
        match (names.first(), names.last()) {
            (Some(first), Some(last)) => Ok((first.clone(), last.clone())),
            _ => Err(CatalogError::EmptyDirectory(self.dir.clone())),
        }
    }

    /// Path of the frame for `datehour`.
    pub fn lookup(&self, datehour: &str) -> Result<PathBuf, CatalogError> {
        let requested = frame_name_for_datehour(datehour)?;
        let (first, last) = self.range()?;

        if requested < first || requested > last {
            return Err(CatalogError::OutOfRange {
                requested,
                first,
                last,
            });
        }

        let path = self.dir.join(&requested);
        if !path.is_file() {
            return Err(CatalogError::Missing(requested));
        }
        debug!(path = %path.display(), "Resolved frame");
        Ok(path)
    }
}

/// Frame file name for a datehour, snapped to the hour.
pub fn frame_name_for_datehour(datehour: &str) -> Result<String, CatalogError> {
    let invalid = || CatalogError::InvalidDatehour(datehour.to_string());

    if !matches_shape(datehour, "dddd-dd-ddTdd:dd") {
        return Err(invalid());
    }
    let parsed = NaiveDateTime::parse_from_str(datehour, DATEHOUR_FORMAT).map_err(|_| invalid())?;
    Ok(parsed.format("%Y-%m-%dT%H-00-00.png").to_string())
}

/// Whether `name` looks like `YYYY-MM-DDTHH-MM-SS.png`.
fn is_frame_name(name: &str) -> bool {
    name.strip_suffix(".png")
        .is_some_and(|stem| matches_shape(stem, "dddd-dd-ddTdd-dd-dd"))
}

/// Match `s` against a template where `d` is any ASCII digit and every other
/// character must appear literally.
fn matches_shape(s: &str, template: &str) -> bool {
    s.len() == template.len()
        && s.bytes().zip(template.bytes()).all(|(c, t)| match t {
            b'd' => c.is_ascii_digit(),
            _ => c == t,
        })
}
