//! PNG encoding for 8-bit RGB frames.
//!
//! Frames are written as truecolor PNG (color type 2, bit depth 8) with no
//! scanline filtering, zlib-compressed in a single IDAT chunk.

use std::io::Write;

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Bytes per RGB pixel
const RGB_CHANNELS: usize = 3;

/// Create a PNG image from interleaved RGB pixel data (color type 2).
///
/// # Arguments
/// - `pixels`: RGB pixel data (3 bytes per pixel, row-major)
/// - `width`: Image width in pixels
/// - `height`: Image height in pixels
pub fn create_png_rgb(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    if pixels.len() != width * height * RGB_CHANNELS {
        return Err(format!(
            "expected {} bytes for {}x{} RGB, got {}",
            width * height * RGB_CHANNELS,
            width,
            height,
            pixels.len()
        ));
    }
    if width == 0 || height == 0 {
        return Err(format!("invalid image size {}x{}", width, height));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&PNG_SIGNATURE);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(2); // color type (RGB)
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data =
        deflate_idat_rgb(pixels, width, height).map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    // Write length
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());

    // Write chunk type
    png.extend_from_slice(chunk_type);

    // Write data
    png.extend_from_slice(data);

    // Write CRC over type + data
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Deflate RGB image data for IDAT chunk.
fn deflate_idat_rgb(
    pixels: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let stride = width * RGB_CHANNELS;

    // Add filter byte (0 = no filter) to each scanline
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in pixels.chunks_exact(stride) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    // Compress with flate2
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    let compressed = encoder.finish()?;

    Ok(compressed)
}
