//! Frame composition: three encoded channels stacked into one RGB raster.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use moisture_common::{frame_file_name, FrameError, FrameResult, GridShape};
use tracing::debug;

use crate::encode::{encode_channel, ScalingLaw};
use crate::png::create_png_rgb;

/// An 8-bit RGB raster for one timestep, `(lat, lon, 3)` interleaved.
///
/// Latitude rows map to image rows and longitude columns to image columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    timestamp: NaiveDateTime,
    grid: GridShape,
    pixels: Vec<u8>,
}

impl EncodedFrame {
    /// Interleave three equal-shaped byte channels.
    pub fn compose(
        timestamp: NaiveDateTime,
        grid: GridShape,
        red: &[u8],
        green: &[u8],
        blue: &[u8],
    ) -> FrameResult<Self> {
        let n = grid.len();
        if red.len() != n || green.len() != n || blue.len() != n {
            return Err(FrameError::shape_mismatch(format!(
                "channels of {}, {}, {} bytes for a {}x{} frame",
                red.len(),
                green.len(),
                blue.len(),
                grid.nlat,
                grid.nlon
            )));
        }

        let mut pixels = Vec::with_capacity(n * 3);
        for ((&r, &g), &b) in red.iter().zip(green).zip(blue) {
            pixels.extend_from_slice(&[r, g, b]);
        }

        Ok(Self {
            timestamp,
            grid,
            pixels,
        })
    }

    /// Encode three real-valued fields with their laws and compose them.
    pub fn from_fields(
        timestamp: NaiveDateTime,
        grid: GridShape,
        channels: [(&[f32], &ScalingLaw); 3],
    ) -> FrameResult<Self> {
        let [(r, r_law), (g, g_law), (b, b_law)] = channels;
        Self::compose(
            timestamp,
            grid,
            &encode_channel(r, r_law),
            &encode_channel(g, g_law),
            &encode_channel(b, b_law),
        )
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    /// Interleaved RGB bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGB triple at (lat, lon).
    pub fn pixel(&self, lat: usize, lon: usize) -> Option<[u8; 3]> {
        if lat >= self.grid.nlat || lon >= self.grid.nlon {
            return None;
        }
        let i = self.grid.flat_index(lat, lon) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// One channel (0 = red, 1 = green, 2 = blue) de-interleaved.
    pub fn channel(&self, index: usize) -> Vec<u8> {
        self.pixels.iter().skip(index).step_by(3).copied().collect()
    }

    /// Output file name derived from the timestamp.
    pub fn file_name(&self) -> String {
        frame_file_name(&self.timestamp)
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> FrameResult<Vec<u8>> {
        create_png_rgb(&self.pixels, self.grid.nlon, self.grid.nlat).map_err(FrameError::Render)
    }

    /// Write `<dir>/<file_name>`; an existing file with the same name is
    /// overwritten.
    pub fn write_png(&self, dir: &Path) -> FrameResult<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_png()?)?;
        debug!(path = %path.display(), "Wrote frame");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 11, 22)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_compose_interleaves() {
        let grid = GridShape::new(1, 2);
        let frame = EncodedFrame::compose(ts(), grid, &[1, 2], &[3, 4], &[5, 6]).unwrap();
        assert_eq!(frame.pixels(), &[1, 3, 5, 2, 4, 6]);
        assert_eq!(frame.pixel(0, 1), Some([2, 4, 6]));
        assert_eq!(frame.channel(1), vec![3, 4]);
    }

    #[test]
    fn test_compose_rejects_mismatched_channels() {
        let grid = GridShape::new(1, 2);
        let err = EncodedFrame::compose(ts(), grid, &[1, 2], &[3], &[5, 6]).unwrap_err();
        assert!(matches!(err, FrameError::ShapeMismatch(_)));
    }

    #[test]
    fn test_file_name_from_timestamp() {
        let grid = GridShape::new(1, 1);
        let frame = EncodedFrame::compose(ts(), grid, &[0], &[0], &[0]).unwrap();
        assert_eq!(frame.file_name(), "2021-11-22T06-00-00.png");
    }

    #[test]
    fn test_from_fields_uses_each_law() {
        let grid = GridShape::new(1, 1);
        let tcw = ScalingLaw::new(0.0, 110.0);
        let anomaly = ScalingLaw::new(-50.0, 50.0);
        let (r, g, b): (&[f32], &[f32], &[f32]) = (&[55.0], &[200.0], &[-60.0]);
        let frame = EncodedFrame::from_fields(ts(), grid, [(r, &tcw), (g, &tcw), (b, &anomaly)]).unwrap();
        assert_eq!(frame.pixel(0, 0), Some([127, 255, 0]));
    }
}
