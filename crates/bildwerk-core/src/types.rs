// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Bildwerk.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BildwerkError, Result};

/// Unique identifier for one conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionId(pub Uuid);

impl ConversionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raster formats accepted as input. The list is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputFormat {
    Png,
    Jpeg,
}

impl InputFormat {
    /// Every accepted format, in display order.
    pub const ALL: [InputFormat; 2] = [InputFormat::Png, InputFormat::Jpeg];

    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extensions that map to this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg"],
        }
    }

    /// Infer the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Every accepted extension, comma separated.
    pub fn accepted_extensions() -> String {
        Self::ALL
            .iter()
            .flat_map(|format| format.extensions())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Infer the format from a file name or path, rejecting anything outside
    /// the allow-list.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                BildwerkError::UnsupportedFormat(format!(
                    "{} (accepted: {})",
                    path.display(),
                    Self::accepted_extensions()
                ))
            })
    }
}

/// Color layout of a decoded image, independent of bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Opaque RGB.
    Rgb,
    /// RGB with an alpha channel.
    RgbAlpha,
    /// Opaque grayscale.
    Gray,
    /// Grayscale with an alpha channel.
    GrayAlpha,
    /// Indexed colour, optionally with per-entry transparency.
    Palette { transparency: bool },
}

impl ColorMode {
    /// Whether pixels of this mode can be anything but fully opaque.
    pub fn has_transparency(&self) -> bool {
        match self {
            Self::Rgb | Self::Gray => false,
            Self::RgbAlpha | Self::GrayAlpha => true,
            Self::Palette { transparency } => *transparency,
        }
    }
}

/// Fixed page bounds in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageGeometry {
    width: u32,
    height: u32,
}

impl PageGeometry {
    /// ISO A4 at 72 points per inch.
    pub const A4: PageGeometry = PageGeometry {
        width: 595,
        height: 842,
    };

    /// Build a geometry, rejecting zero-sized bounds.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BildwerkError::Config(format!(
                "page geometry {width}x{height} must be non-zero on both axes"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether a `width` x `height` box fits inside these bounds.
    pub fn contains(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// How a normalized page is laid out in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePlacement {
    /// The page is exactly the scaled image; page sizes vary per image.
    #[default]
    TightFit,
    /// The scaled image is centred on a white canvas of the full page
    /// geometry, so every page has the same size.
    Canvas,
}
