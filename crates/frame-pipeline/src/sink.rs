//! Destinations for encoded frames.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use moisture_common::FrameResult;
use renderer::EncodedFrame;

/// Receives every frame the streamer produces, one at a time in time order.
pub trait FrameSink {
    fn accept(&self, frame: EncodedFrame) -> FrameResult<()>;
}

/// Writes `<timestamp>.png` files into a directory.
#[derive(Debug, Clone)]
pub struct PngDirectorySink {
    dir: PathBuf,
}

impl PngDirectorySink {
    /// Create the directory (and parents) if absent.
    pub fn create<P: AsRef<Path>>(dir: P) -> FrameResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for PngDirectorySink {
    fn accept(&self, frame: EncodedFrame) -> FrameResult<()> {
        frame.write_png(&self.dir)?;
        Ok(())
    }
}

/// Keeps frames in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    frames: Mutex<Vec<EncodedFrame>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected frames in timestamp order.
    pub fn into_frames(self) -> Vec<EncodedFrame> {
        let mut frames = self
            .frames
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        frames.sort_by_key(|f| f.timestamp());
        frames
    }
}

impl FrameSink for CollectingSink {
    fn accept(&self, frame: EncodedFrame) -> FrameResult<()> {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(frame);
        Ok(())
    }
}
