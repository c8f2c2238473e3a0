//! Affine clip-and-quantize encoding of real-valued fields to 8-bit channels.
//!
//! Every channel uses the same law with its own bounds:
//!
//! ```text
//! byte = trunc(clamp((x - min) * scale, 0, 255)),  scale = 255 / (max - min)
//! ```
//!
//! Values at or below `min` become 0, values at or above `max` become 255, and
//! NaN becomes 0 on every channel. The mapping is lossy and not invertible.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum field size to benefit from parallel encoding
const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Real-valued bounds of one color channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingLaw {
    pub min: f64,
    pub max: f64,
}

impl ScalingLaw {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Derived scale, `255 / (max - min)`.
    pub fn scale(&self) -> f64 {
        255.0 / (self.max - self.min)
    }

    /// Whether the bounds define a usable law.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }

    /// Precompute the f32 constants used in the hot loop.
    pub fn kernel(&self) -> ChannelKernel {
        ChannelKernel {
            min: self.min as f32,
            max: self.max as f32,
            scale: self.scale() as f32,
        }
    }
}

/// f32 form of a [`ScalingLaw`], matching the precision of the source data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelKernel {
    min: f32,
    max: f32,
    scale: f32,
}

impl ChannelKernel {
    /// Encode a single value.
    #[inline(always)]
    pub fn encode(&self, x: f32) -> u8 {
        if x.is_nan() {
            return 0;
        }
        if x >= self.max {
            return 255;
        }
        ((x - self.min) * self.scale).clamp(0.0, 255.0) as u8
    }
}

/// Encode a field into a freshly allocated byte channel.
pub fn encode_channel(field: &[f32], law: &ScalingLaw) -> Vec<u8> {
    let mut out = vec![0u8; field.len()];
    encode_into(field, law, &mut out);
    out
}

/// Encode a field into `out`, which must have the same length.
pub fn encode_into(field: &[f32], law: &ScalingLaw, out: &mut [u8]) {
    debug_assert_eq!(field.len(), out.len());
    let kernel = law.kernel();

    if field.len() >= PARALLEL_THRESHOLD {
        let chunk = (field.len() / rayon::current_num_threads()).max(4096);
        out.par_chunks_mut(chunk)
            .zip(field.par_chunks(chunk))
            .for_each(|(o, f)| {
                for (b, &x) in o.iter_mut().zip(f) {
                    *b = kernel.encode(x);
                }
            });
    } else {
        for (b, &x) in out.iter_mut().zip(field) {
            *b = kernel.encode(x);
        }
    }
}
