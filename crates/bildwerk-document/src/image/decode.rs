// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decode capability — turn encoded PNG/JPEG bytes into a `RasterImage`.
//
// Direct-colour images are decoded by the `image` crate. Indexed PNGs are read
// with the `png` crate without palette expansion, so palette transparency
// reaches the normalizer intact.

use bildwerk_core::InputFormat;
use bildwerk_core::error::{BildwerkError, Result};
use image::ImageFormat;
use tracing::{debug, instrument};

use super::raster::RasterImage;

/// Something that can decode the allow-listed raster formats.
pub trait ImageDecoder: Send + Sync {
    /// Decode `bytes`, which the caller declares to be in `format`.
    ///
    /// Bytes that do not parse as the declared format are a `Decode` error.
    fn decode(&self, bytes: &[u8], format: InputFormat) -> Result<RasterImage>;
}

/// Default decoder backed by the `image` and `png` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl ImageDecoder for StandardDecoder {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len(), format = format.mime_type()))]
    fn decode(&self, bytes: &[u8], format: InputFormat) -> Result<RasterImage> {
        if format == InputFormat::Png {
            if let Some(indexed) = decode_indexed_png(bytes)? {
                return Ok(indexed);
            }
        }

        let image = image::load_from_memory_with_format(bytes, image_format(format))
            .map_err(|err| {
                BildwerkError::Decode(format!("not a valid {}: {}", format.mime_type(), err))
            })?;
        debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Image decoded"
        );
        Ok(RasterImage::from_dynamic(image))
    }
}

fn image_format(format: InputFormat) -> ImageFormat {
    match format {
        InputFormat::Png => ImageFormat::Png,
        InputFormat::Jpeg => ImageFormat::Jpeg,
    }
}

/// Decode a PNG as indexed colour if that is how it is stored.
///
/// Returns `Ok(None)` for every other PNG colour type so the caller can fall
/// back to the general decoder.
fn decode_indexed_png(bytes: &[u8]) -> Result<Option<RasterImage>> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder
        .read_info()
        .map_err(|err| BildwerkError::Decode(format!("not a valid image/png: {err}")))?;

    let (width, height, bit_depth, palette, alpha) = {
        let info = reader.info();
        if info.color_type != png::ColorType::Indexed {
            return Ok(None);
        }
        let palette: Vec<[u8; 3]> = info
            .palette
            .as_ref()
            .ok_or_else(|| BildwerkError::Decode("indexed PNG has no PLTE chunk".into()))?
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        let alpha = info.trns.as_ref().map(|trns| trns.to_vec());
        (info.width, info.height, info.bit_depth as u8, palette, alpha)
    };

    let mut buffer = vec![0u8; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buffer)
        .map_err(|err| BildwerkError::Decode(format!("corrupt PNG image data: {err}")))?;
    let indices = unpack_indices(
        &buffer[..frame.buffer_size()],
        width,
        height,
        frame.line_size,
        bit_depth,
    );

    debug!(
        width,
        height,
        bit_depth,
        palette_len = palette.len(),
        has_trns = alpha.is_some(),
        "Indexed PNG decoded"
    );
    RasterImage::indexed(width, height, indices, palette, alpha).map(Some)
}

/// Expand packed 1/2/4/8-bit palette indices to one byte per pixel.
fn unpack_indices(
    data: &[u8],
    width: u32,
    height: u32,
    line_size: usize,
    bit_depth: u8,
) -> Vec<u8> {
    let width = width as usize;
    let bit_depth = bit_depth.clamp(1, 8);
    let per_byte = usize::from(8 / bit_depth);
    let mask = ((1u16 << bit_depth) - 1) as u8;

    let mut indices = Vec::with_capacity(width * height as usize);
    for row in data.chunks(line_size.max(1)).take(height as usize) {
        for x in 0..width {
            let byte = row.get(x / per_byte).copied().unwrap_or(0);
            let shift = 8 - bit_depth * (x % per_byte + 1) as u8;
            indices.push((byte >> shift) & mask);
        }
    }
    indices
}
