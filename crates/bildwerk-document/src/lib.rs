// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-document — Image-to-PDF conversion for Bildwerk.
//
// Provides image decoding (PNG, JPEG, indexed PNG), page normalization
// (transparency flattening and fit-to-page scaling), document assembly, PDF
// encoding and inspection, and the conversion pipeline that ties them together.

pub mod assemble;
pub mod image;
pub mod integrity;
pub mod pdf;
pub mod pipeline;

// Re-export the primary structs so callers can use `bildwerk_document::Converter` etc.
pub use assemble::{Document, assemble};
pub use image::{ImageDecoder, NormalizedPage, PageNormalizer, RasterImage, StandardDecoder};
pub use pdf::reader::PdfReader;
pub use pdf::writer::{DocumentEncoder, PdfWriter};
pub use pipeline::{BatchOutcome, ConversionOutput, Converter, ImageInput};
