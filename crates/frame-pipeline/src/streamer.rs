//! Time-block streaming of a recipe over the full time axis.
//!
//! Only one block of input fields is resident at a time. Each block is
//! realigned once when loaded; the timesteps inside it are then composed in
//! parallel and handed to the sink one by one in time order.

use std::ops::Range;

use moisture_common::{FrameError, FrameResult};
use rayon::prelude::*;
use tracing::{debug, info};

use renderer::EncodedFrame;

use crate::realign::LongitudeShift;
use crate::recipe::FrameRecipe;
use crate::sink::FrameSink;

/// Split `0..n` into contiguous ranges of at most `size` steps.
pub fn block_ranges(n: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    let size = size.max(1);
    (0..n).step_by(size).map(move |start| start..(start + size).min(n))
}

/// Outcome of one streaming run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Frames handed to the sink.
    pub frames_written: usize,
    /// Timesteps the recipe declined to render.
    pub skipped: usize,
    /// Blocks loaded.
    pub blocks: usize,
}

/// Drives a [`FrameRecipe`] over its time axis block by block.
#[derive(Debug, Clone, Copy)]
pub struct TimeBlockStreamer {
    block_size: usize,
    shift: LongitudeShift,
}

impl TimeBlockStreamer {
    pub fn new(block_size: usize, shift: LongitudeShift) -> FrameResult<Self> {
        if block_size == 0 {
            return Err(FrameError::InvalidConfig(
                "time block size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { block_size, shift })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn run<R, S>(&self, recipe: &R, sink: &S) -> FrameResult<StreamSummary>
    where
        R: FrameRecipe,
        S: FrameSink + ?Sized,
    {
        let times = recipe.times();
        let total = times.len().div_ceil(self.block_size);
        let mut summary = StreamSummary::default();

        info!(
            recipe = recipe.name(),
            timesteps = times.len(),
            blocks = total,
            block_size = self.block_size,
            "Streaming frames"
        );

        for (index, range) in block_ranges(times.len(), self.block_size).enumerate() {
            let block = recipe.load_block(range.clone(), &self.shift)?;
            let start = range.start;

            let composed: Vec<Option<EncodedFrame>> = range
                .clone()
                .into_par_iter()
                .map(|i| recipe.compose(&block, i - start, times[i]))
                .collect::<FrameResult<_>>()?;

            // Frames sharing a second overwrite each other; the later one wins.
            for (i, frame) in range.zip(composed) {
                match frame {
                    Some(frame) => {
                        sink.accept(frame)?;
                        summary.frames_written += 1;
                    }
                    None => {
                        debug!(timestamp = %times[i], "No frame for timestep");
                        summary.skipped += 1;
                    }
                }
            }
            summary.blocks += 1;

            info!(
                block = index + 1,
                blocks = total,
                frames_written = summary.frames_written,
                "Finished time block"
            );
        }

        Ok(summary)
    }
}
