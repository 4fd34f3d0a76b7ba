// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use thiserror::Error;

/// Top-level error type for all Bildwerk operations.
///
/// Every variant is a deterministic failure of the request that raised it;
/// none of them is worth retrying with the same input.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Page normalization --
    #[error("degenerate image: {width}x{height} has zero area")]
    DegenerateImage { width: u32, height: u32 },

    #[error("unsupported color mode: {0}")]
    UnsupportedColorMode(String),

    // -- Document assembly --
    #[error("cannot assemble a document from an empty page sequence")]
    EmptyPageSequence,

    // -- Input handling --
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("input is {size} bytes, larger than the {limit} byte limit")]
    InputTooLarge { size: u64, limit: u64 },

    /// One input of a multi-image request failed; no document was produced.
    #[error("input {index} ({name}) failed: {source}")]
    InputFailed {
        index: usize,
        name: String,
        #[source]
        source: Box<BildwerkError>,
    },

    // -- Codec / backend --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Runtime --
    #[error("worker task failed: {0}")]
    Task(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;
