//! Pixel encoding for gridded fields.
//!
//! - [`encode`]: per-channel affine clip-and-quantize law
//! - [`frame`]: stacking three channels into one RGB raster
//! - [`png`]: truecolor PNG output

pub mod encode;
pub mod frame;
pub mod png;

pub use encode::{encode_channel, encode_into, ChannelKernel, ScalingLaw};
pub use frame::EncodedFrame;
pub use png::create_png_rgb;
