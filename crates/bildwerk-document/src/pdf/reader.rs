// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — inspect produced PDFs (page count and page sizes) using the
// `lopdf` crate.

use bildwerk_core::error::{BildwerkError, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument};

const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Read-only view of an existing PDF.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            BildwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// `(width, height)` in points of every page, in page order, taken from
    /// each page's MediaBox (inherited from the page tree if necessary).
    pub fn page_sizes(&self) -> Result<Vec<(f32, f32)>> {
        // `get_pages` is keyed by 1-indexed page number in a BTreeMap, so
        // iteration is already in page order.
        self.document
            .get_pages()
            .into_iter()
            .map(|(page_number, page_id)| {
                let media_box = self.media_box(page_id).ok_or_else(|| {
                    BildwerkError::PdfError(format!("page {page_number} has no MediaBox"))
                })?;
                Ok((media_box[2] - media_box[0], media_box[3] - media_box[1]))
            })
            .collect()
    }

    /// Walk from a page up through its `/Parent` chain until a MediaBox is
    /// found.
    fn media_box(&self, page_id: ObjectId) -> Option<[f32; 4]> {
        // Bounded so a cyclic /Parent chain in a malformed file cannot hang.
        let mut id = page_id;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            let dict = self.document.get_dictionary(id).ok()?;
            if let Ok(object) = dict.get(b"MediaBox") {
                return self.rectangle(object);
            }
            id = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        }
        None
    }

    fn rectangle(&self, object: &Object) -> Option<[f32; 4]> {
        let object = match object {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            other => other,
        };
        let values: Vec<f32> = object
            .as_array()
            .ok()?
            .iter()
            .filter_map(number)
            .collect();
        values.try_into().ok()
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}
