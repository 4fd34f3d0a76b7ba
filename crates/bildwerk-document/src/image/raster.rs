// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoded raster images as handed from the decode capability to the page
// normalizer.

use bildwerk_core::ColorMode;
use bildwerk_core::error::{BildwerkError, Result};
use image::DynamicImage;

/// An in-memory decoded image.
///
/// Either a direct-colour image backed by `image::DynamicImage`, or an
/// indexed-colour image that still carries its palette and optional per-entry
/// alpha. Values are consumed by the normalizer and never modified in place.
#[derive(Debug, Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Pixels,
}

#[derive(Debug, Clone)]
pub(crate) enum Pixels {
    Direct(DynamicImage),
    Indexed(IndexedPixels),
}

/// Palette image data: one index per pixel, row-major.
#[derive(Debug, Clone)]
pub(crate) struct IndexedPixels {
    pub(crate) indices: Vec<u8>,
    pub(crate) palette: Vec<[u8; 3]>,
    /// Alpha per palette entry (`tRNS`). Entries past the end are opaque.
    pub(crate) alpha: Option<Vec<u8>>,
}

impl IndexedPixels {
    /// RGB and alpha for one palette index.
    pub(crate) fn lookup(&self, index: u8) -> ([u8; 3], u8) {
        let rgb = self.palette[usize::from(index)];
        let alpha = self
            .alpha
            .as_ref()
            .and_then(|alpha| alpha.get(usize::from(index)).copied())
            .unwrap_or(u8::MAX);
        (rgb, alpha)
    }
}

impl RasterImage {
    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: Pixels::Direct(image),
        }
    }

    /// Build an indexed-colour image.
    ///
    /// `indices` holds one palette index per pixel. `alpha`, when present, is
    /// the transparency table; it may be shorter than the palette but not
    /// longer.
    pub fn indexed(
        width: u32,
        height: u32,
        indices: Vec<u8>,
        palette: Vec<[u8; 3]>,
        alpha: Option<Vec<u8>>,
    ) -> Result<Self> {
        let expected = width as usize * height as usize;
        if indices.len() != expected {
            return Err(BildwerkError::ImageError(format!(
                "indexed image {width}x{height} needs {expected} indices, got {}",
                indices.len()
            )));
        }
        if palette.is_empty() && expected > 0 {
            return Err(BildwerkError::ImageError("indexed image has an empty palette".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= palette.len()) {
            return Err(BildwerkError::ImageError(format!(
                "palette index {bad} out of range for a {} entry palette",
                palette.len()
            )));
        }
        if let Some(alpha) = &alpha {
            if alpha.len() > palette.len() {
                return Err(BildwerkError::ImageError(format!(
                    "transparency table has {} entries for a {} entry palette",
                    alpha.len(),
                    palette.len()
                )));
            }
        }
        Ok(Self {
            width,
            height,
            pixels: Pixels::Indexed(IndexedPixels {
                indices,
                palette,
                alpha,
            }),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour mode tag, or `UnsupportedColorMode` for layouts the normalizer
    /// cannot flatten (floating-point HDR and anything newer).
    pub fn color_mode(&self) -> Result<ColorMode> {
        match &self.pixels {
            Pixels::Indexed(indexed) => Ok(ColorMode::Palette {
                transparency: indexed.alpha.is_some(),
            }),
            Pixels::Direct(image) => match image {
                DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgb16(_) => Ok(ColorMode::Rgb),
                DynamicImage::ImageRgba8(_) | DynamicImage::ImageRgba16(_) => {
                    Ok(ColorMode::RgbAlpha)
                }
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => Ok(ColorMode::Gray),
                DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
                    Ok(ColorMode::GrayAlpha)
                }
                other => Err(BildwerkError::UnsupportedColorMode(format!(
                    "{:?}",
                    other.color()
                ))),
            },
        }
    }

    pub(crate) fn into_pixels(self) -> Pixels {
        self.pixels
    }
}
