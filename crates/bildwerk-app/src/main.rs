// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — convert photos and scans into a multi-page PDF.
//
// Entry point. Initialises logging, resolves configuration from the optional
// config file plus command-line flags, runs the conversion, and writes the PDF.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::human_errors::failure_report;
use bildwerk_core::{ConversionConfig, PagePlacement};
use bildwerk_document::{ConversionOutput, Converter, ImageInput};
use clap::Parser;
use tracing::{info, warn};

/// Convert PNG and JPEG images into one PDF, one page per image.
#[derive(Parser, Debug)]
#[command(name = "bildwerk", version, arg_required_else_help = true)]
struct Cli {
    /// Images to convert, in page order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, env = "BILDWERK_OUTPUT", default_value = "output.pdf")]
    output: PathBuf,

    /// JSON settings file. Flags given on the command line take precedence.
    #[arg(short, long, env = "BILDWERK_CONFIG")]
    config: Option<PathBuf>,

    /// Centre every image on a full-size white page instead of sizing each
    /// page to its image.
    #[arg(long)]
    canvas: bool,

    /// Title stored in the PDF metadata.
    #[arg(long)]
    title: Option<String>,

    /// Maximum number of images processed at once.
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Bildwerk starting");

    match run(&cli) {
        Ok(output) => {
            println!(
                "Wrote {} ({} pages, sha256 {})",
                cli.output.display(),
                output.page_count(),
                output.sha256
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            warn!(%err, "Conversion failed");
            eprintln!("{}", failure_report(&err));
            ExitCode::FAILURE
        }
    }
}

/// Resolve settings, convert every input, and write the PDF to `cli.output`.
fn run(cli: &Cli) -> Result<ConversionOutput> {
    let config = resolve_config(cli)?;
    let inputs = cli
        .inputs
        .iter()
        .enumerate()
        .map(|(index, path)| {
            load_input(path, config.max_input_bytes).map_err(|err| BildwerkError::InputFailed {
                index,
                name: display_name(path),
                source: Box::new(err),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let converter = Converter::new(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(converter.convert(inputs))?;

    std::fs::write(&cli.output, &output.pdf)?;
    info!(path = %cli.output.display(), id = %output.id, "PDF written");
    Ok(output)
}

fn resolve_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut config = match &cli.config {
        Some(path) => ConversionConfig::load(path)?,
        None => ConversionConfig::default(),
    };
    if cli.canvas {
        config.placement = PagePlacement::Canvas;
    }
    if let Some(title) = &cli.title {
        config.title = title.clone();
    }
    if cli.concurrency.is_some() {
        config.concurrency = cli.concurrency;
    }
    config.validate()?;
    Ok(config)
}

/// Read one input, refusing oversized files before their bytes are loaded.
fn load_input(path: &Path, max_input_bytes: u64) -> Result<ImageInput> {
    let size = std::fs::metadata(path)?.len();
    if size > max_input_bytes {
        return Err(BildwerkError::InputTooLarge {
            size,
            limit: max_input_bytes,
        });
    }
    ImageInput::from_path(path)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
