// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion pipeline — decode every input, normalize it into a page,
// assemble the pages in submission order, and encode the result.
//
// Normalization is all-or-nothing: a single failing input means no document.
// The concurrent path runs decode+normalize on the blocking thread pool, at
// most `concurrency` at a time, and collects results by submission index so
// completion order never leaks into page order.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{ConversionConfig, ConversionId, InputFormat, PagePlacement};
use chrono::{DateTime, Utc};
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::assemble::{Document, assemble};
use crate::image::{ImageDecoder, NormalizedPage, PageNormalizer, StandardDecoder};
use crate::integrity::hash_bytes;
use crate::pdf::writer::{DocumentEncoder, PdfWriter};

/// One encoded image submitted for conversion.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Display name used in failure reports (usually the file name).
    pub name: String,
    /// Declared format of `bytes`.
    pub format: InputFormat,
    /// Encoded image data.
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(name: impl Into<String>, format: InputFormat, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes,
        }
    }

    /// Read an image file, taking the declared format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = InputFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, format, bytes))
    }
}

/// Result of normalizing every input of one request.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every input produced a page; pages are in submission order.
    AllNormalized(Vec<NormalizedPage>),
    /// The input at `index` failed. No pages are returned.
    Failed {
        index: usize,
        name: String,
        error: BildwerkError,
    },
}

impl BatchOutcome {
    /// Pages on success, or an `InputFailed` error naming the failing input.
    pub fn into_result(self) -> Result<Vec<NormalizedPage>> {
        match self {
            Self::AllNormalized(pages) => Ok(pages),
            Self::Failed { index, name, error } => Err(BildwerkError::InputFailed {
                index,
                name,
                source: Box::new(error),
            }),
        }
    }
}

/// A successfully produced document.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub id: ConversionId,
    pub created_at: DateTime<Utc>,
    /// Encoded output bytes.
    pub pdf: Vec<u8>,
    /// `(width, height)` of each page, in page order.
    pub page_sizes: Vec<(u32, u32)>,
    /// SHA-256 of `pdf`, lowercase hex.
    pub sha256: String,
}

impl ConversionOutput {
    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }
}

/// Per-input work: size check, decode, normalize, optional canvas placement.
#[derive(Debug, Clone, Copy)]
struct PageJob {
    normalizer: PageNormalizer,
    placement: PagePlacement,
    max_input_bytes: u64,
}

impl PageJob {
    fn run<D>(&self, decoder: &D, input: &ImageInput) -> Result<NormalizedPage>
    where
        D: ImageDecoder + ?Sized,
    {
        let size = input.bytes.len() as u64;
        if size > self.max_input_bytes {
            return Err(BildwerkError::InputTooLarge {
                size,
                limit: self.max_input_bytes,
            });
        }

        let raster = decoder.decode(&input.bytes, input.format)?;
        let page = self.normalizer.normalize(raster)?;
        Ok(match self.placement {
            PagePlacement::TightFit => page,
            PagePlacement::Canvas => self.normalizer.place_on_canvas(page),
        })
    }
}

/// Drives the full images-to-document conversion.
///
/// Generic over the decode and encode capabilities so either can be swapped
/// out; [`Converter::new`] wires up the standard PNG/JPEG decoder and the PDF
/// writer.
pub struct Converter<D = StandardDecoder, E = PdfWriter> {
    config: ConversionConfig,
    job: PageJob,
    decoder: Arc<D>,
    encoder: Arc<E>,
}

impl Converter {
    /// Standard converter for the given configuration.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        let writer = PdfWriter::new(config.title.clone());
        Self::with_capabilities(config, StandardDecoder, writer)
    }
}

impl<D, E> Converter<D, E>
where
    D: ImageDecoder + 'static,
    E: DocumentEncoder + 'static,
{
    /// Converter with caller-supplied decode and encode capabilities.
    pub fn with_capabilities(config: ConversionConfig, decoder: D, encoder: E) -> Result<Self> {
        config.validate()?;
        let job = PageJob {
            normalizer: PageNormalizer::new(config.geometry),
            placement: config.placement,
            max_input_bytes: config.max_input_bytes,
        };
        Ok(Self {
            config,
            job,
            decoder: Arc::new(decoder),
            encoder: Arc::new(encoder),
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    // -- Normalization --------------------------------------------------------

    /// Normalize inputs one after another, stopping at the first failure.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn normalize_all_blocking(&self, inputs: &[ImageInput]) -> BatchOutcome {
        let mut pages = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            match self.job.run(self.decoder.as_ref(), input) {
                Ok(page) => {
                    log_page(index, &input.name, &page);
                    pages.push(page);
                }
                Err(error) => return rejected(index, input.name.clone(), error),
            }
        }
        BatchOutcome::AllNormalized(pages)
    }

    /// Normalize inputs concurrently on the blocking thread pool.
    ///
    /// At most `effective_concurrency()` inputs are in flight. Finished work is
    /// collected in submission order whenever the pool is full, so a failure
    /// stops the batch before later inputs are started. Pages come back in
    /// submission order; if several inputs fail, the lowest index is reported,
    /// matching the sequential path.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub async fn normalize_all(&self, inputs: Vec<ImageInput>) -> BatchOutcome {
        let limit = self.config.effective_concurrency().min(inputs.len().max(1));
        let permits = Arc::new(Semaphore::new(limit));
        debug!(limit, "Starting concurrent normalization");

        let mut pending: VecDeque<InFlight> = VecDeque::with_capacity(limit);
        let mut pages = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let permit = loop {
                match Arc::clone(&permits).try_acquire_owned() {
                    Ok(permit) => break Ok(permit),
                    Err(TryAcquireError::NoPermits) => match pending.pop_front() {
                        // Finishing the oldest task releases its permit.
                        Some(mut oldest) => match oldest.join().await {
                            Ok(page) => pages.push(page),
                            Err(error) => return rejected(oldest.index, oldest.name, error),
                        },
                        None => {
                            break Arc::clone(&permits).acquire_owned().await.map_err(|err| {
                                BildwerkError::Task(format!("worker pool closed: {err}"))
                            });
                        }
                    },
                    Err(TryAcquireError::Closed) => {
                        break Err(BildwerkError::Task("worker pool closed".into()));
                    }
                }
            };
            let permit = match permit {
                Ok(permit) => permit,
                Err(error) => return rejected(index, input.name, error),
            };

            let decoder = Arc::clone(&self.decoder);
            let job = self.job;
            let name = input.name.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job.run(decoder.as_ref(), &input)
            });
            pending.push_back(InFlight {
                index,
                name,
                handle,
            });
        }

        while let Some(mut task) = pending.pop_front() {
            match task.join().await {
                Ok(page) => pages.push(page),
                Err(error) => return rejected(task.index, task.name, error),
            }
        }
        BatchOutcome::AllNormalized(pages)
    }

    // -- Full conversion ------------------------------------------------------

    /// Convert on the current thread.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn convert_blocking(&self, inputs: &[ImageInput]) -> Result<ConversionOutput> {
        let id = ConversionId::new();
        info!(%id, "Conversion started");

        let pages = self.normalize_all_blocking(inputs).into_result()?;
        let document = assemble(pages)?;
        let page_sizes = document.page_sizes();
        let pdf = self.encoder.encode_document(document)?;
        Ok(self.finish(id, pdf, page_sizes))
    }

    /// Convert with concurrent normalization; encoding also runs off the
    /// async executor.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub async fn convert(&self, inputs: Vec<ImageInput>) -> Result<ConversionOutput> {
        let id = ConversionId::new();
        info!(%id, "Conversion started");

        let pages = self.normalize_all(inputs).await.into_result()?;
        let document = assemble(pages)?;
        let page_sizes = document.page_sizes();
        let pdf = self.encode_off_thread(document).await?;
        Ok(self.finish(id, pdf, page_sizes))
    }

    async fn encode_off_thread(&self, document: Document) -> Result<Vec<u8>> {
        let encoder = Arc::clone(&self.encoder);
        tokio::task::spawn_blocking(move || encoder.encode_document(document))
            .await
            .map_err(|err| BildwerkError::Task(format!("encoding task panicked: {err}")))?
    }

    fn finish(
        &self,
        id: ConversionId,
        pdf: Vec<u8>,
        page_sizes: Vec<(u32, u32)>,
    ) -> ConversionOutput {
        let sha256 = hash_bytes(&pdf);
        info!(
            %id,
            pages = page_sizes.len(),
            bytes = pdf.len(),
            %sha256,
            "Conversion complete"
        );
        ConversionOutput {
            id,
            created_at: Utc::now(),
            pdf,
            page_sizes,
            sha256,
        }
    }
}

/// A submitted normalization that has not been collected yet.
struct InFlight {
    index: usize,
    name: String,
    handle: JoinHandle<Result<NormalizedPage>>,
}

impl InFlight {
    async fn join(&mut self) -> Result<NormalizedPage> {
        (&mut self.handle)
            .await
            .map_err(|err| BildwerkError::Task(format!("normalization task panicked: {err}")))?
    }
}

fn log_page(index: usize, name: &str, page: &NormalizedPage) {
    let (source_width, source_height) = page.source_dimensions();
    debug!(
        index,
        name,
        source_width,
        source_height,
        width = page.width(),
        height = page.height(),
        "Page normalized"
    );
}

fn rejected(index: usize, name: String, error: BildwerkError) -> BatchOutcome {
    warn!(index, %name, %error, "Input rejected");
    BatchOutcome::Failed { index, name, error }
}
