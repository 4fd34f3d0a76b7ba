// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion configuration.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BildwerkError, Result};
use crate::types::{PageGeometry, PagePlacement};

/// Default per-input size cap: 500 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 500 * 1024 * 1024;

/// Upper bound on concurrent normalizations.
pub const MAX_CONCURRENCY: usize = 1024;

/// Settings for one image-to-PDF conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Bounds every normalized page must fit inside.
    pub geometry: PageGeometry,
    /// Tight-fit pages or full-size canvases.
    pub placement: PagePlacement,
    /// Inputs larger than this are rejected before decoding.
    pub max_input_bytes: u64,
    /// Maximum concurrent normalizations. `None` uses the available
    /// parallelism of the host.
    pub concurrency: Option<usize>,
    /// Title written into the PDF metadata.
    pub title: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            placement: PagePlacement::TightFit,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            concurrency: None,
            title: "Bildwerk Document".into(),
        }
    }
}

impl ConversionConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject settings no conversion could run with.
    pub fn validate(&self) -> Result<()> {
        if self.geometry.width() == 0 || self.geometry.height() == 0 {
            return Err(BildwerkError::Config(format!(
                "page geometry {}x{} must be non-zero on both axes",
                self.geometry.width(),
                self.geometry.height()
            )));
        }
        match self.concurrency {
            Some(0) => {
                return Err(BildwerkError::Config("concurrency must be at least 1".into()));
            }
            Some(n) if n > MAX_CONCURRENCY => {
                return Err(BildwerkError::Config(format!(
                    "concurrency {n} exceeds the maximum of {MAX_CONCURRENCY}"
                )));
            }
            _ => {}
        }
        if self.title.trim().is_empty() {
            return Err(BildwerkError::Config("title must not be empty".into()));
        }
        Ok(())
    }

    /// Resolved worker count: the configured value, else the host's
    /// available parallelism, else 1. Always within `1..=MAX_CONCURRENCY`.
    pub fn effective_concurrency(&self) -> usize {
        let requested = match self.concurrency {
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        };
        requested.clamp(1, MAX_CONCURRENCY)
    }
}
