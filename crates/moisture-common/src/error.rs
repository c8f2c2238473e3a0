//! Error types for the frame encoding pipeline.

use thiserror::Error;

/// Result type alias using FrameError.
pub type FrameResult<T> = Result<T, FrameError>;

/// Primary error type for frame generation.
///
/// Schema and coverage failures are detected once during setup and abort the
/// run. Saturation, unmapped timesteps and filename collisions are recovered
/// silently and never surface here.
#[derive(Debug, Error)]
pub enum FrameError {
    // === Setup Errors (fatal) ===
    #[error("Could not find a {kind} among {tried:?}; available: {available:?}")]
    SchemaResolution {
        kind: &'static str,
        tried: Vec<String>,
        available: Vec<String>,
    },

    #[error("No baseline samples for calendar month {month}")]
    ClimatologyCoverage { month: u32 },

    #[error("Grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid time coordinate: {0}")]
    InvalidTime(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Data Errors ===
    #[error("Failed to read data: {0}")]
    DataRead(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create a DataRead error.
    pub fn data_read(msg: impl Into<String>) -> Self {
        Self::DataRead(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_aliases_and_available() {
        let err = FrameError::SchemaResolution {
            kind: "time coordinate",
            tried: vec!["valid_time".into(), "time".into()],
            available: vec!["latitude".into(), "longitude".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("valid_time"));
        assert!(msg.contains("longitude"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: FrameError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, FrameError::Io(_)));
    }
}
