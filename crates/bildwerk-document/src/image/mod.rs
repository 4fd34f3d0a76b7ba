// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding, decoded raster representation, and page
// normalization (alpha flattening plus fit-to-page scaling).

pub mod decode;
pub mod normalize;
pub mod raster;

pub use decode::{ImageDecoder, StandardDecoder};
pub use normalize::{NormalizedPage, PageNormalizer, fit_within};
pub use raster::RasterImage;
