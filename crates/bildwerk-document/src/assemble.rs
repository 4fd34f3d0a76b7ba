// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — compose normalized pages into one ordered document.

use bildwerk_core::error::{BildwerkError, Result};
use tracing::{debug, instrument};

use crate::image::NormalizedPage;

/// An ordered, non-empty sequence of normalized pages.
///
/// Page `i` is the `i`-th page handed to [`assemble`]. Pages keep their own
/// sizes; nothing here forces them to a common size.
#[derive(Debug, Clone)]
pub struct Document {
    pages: Vec<NormalizedPage>,
}

impl Document {
    /// Number of pages (always at least one).
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Borrow the pages in document order.
    pub fn pages(&self) -> &[NormalizedPage] {
        &self.pages
    }

    /// `(width, height)` of every page in document order.
    pub fn page_sizes(&self) -> Vec<(u32, u32)> {
        self.pages.iter().map(|p| (p.width(), p.height())).collect()
    }

    /// Consume the document, yielding the pages in order.
    pub fn into_pages(self) -> Vec<NormalizedPage> {
        self.pages
    }
}

/// Assemble pages into a [`Document`] in exactly the order given.
///
/// Takes ownership of the pages; pixel buffers are moved, not copied.
#[instrument(skip_all, fields(pages = pages.len()))]
pub fn assemble(pages: Vec<NormalizedPage>) -> Result<Document> {
    if pages.is_empty() {
        return Err(BildwerkError::EmptyPageSequence);
    }
    let sizes: Vec<(u32, u32)> = pages.iter().map(|p| (p.width(), p.height())).collect();
    debug!(?sizes, "Document assembled");
    Ok(Document { pages })
}
