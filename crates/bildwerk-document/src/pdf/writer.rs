// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — encode an assembled `Document` as a multi-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use bildwerk_core::error::Result;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::assemble::Document;

/// Page pixels map 1:1 onto PDF points.
const POINTS_PER_INCH: f32 = 72.0;

/// Millimetres per PDF point.
const MM_PER_POINT: f32 = 25.4 / POINTS_PER_INCH;

/// Something that can serialise a [`Document`] into output bytes.
pub trait DocumentEncoder: Send + Sync {
    /// Encode every page of `document`, in document order, as sequential
    /// pages of one output file.
    fn encode_document(&self, document: Document) -> Result<Vec<u8>>;
}

/// Writes documents as PDF, one image per page.
///
/// Each page's MediaBox equals the page's pixel size in points and the image
/// covers the page edge to edge.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    /// Create a writer with the given document title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("Bildwerk Document")
    }
}

impl DocumentEncoder for PdfWriter {
    #[instrument(skip_all, fields(pages = document.len(), title = %self.title))]
    fn encode_document(&self, document: Document) -> Result<Vec<u8>> {
        info!("Encoding PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(document.len());

        for (index, page) in document.into_pages().into_iter().enumerate() {
            let (width, height) = (page.width(), page.height());
            let rgb = page.into_rgb8();

            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // At 72 dpi one pixel is one point, so the image fills a page of
            // exactly its own size.
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(POINTS_PER_INCH),
                    rotate: None,
                },
            }];

            pages.push(PdfPage::new(
                points_to_mm(width),
                points_to_mm(height),
                ops,
            ));
            debug!(index, width, height, "Page placed");
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }

        debug!(output_bytes = output.len(), "PDF encoded");
        Ok(output)
    }
}

fn points_to_mm(points: u32) -> Mm {
    Mm(points as f32 * MM_PER_POINT)
}
