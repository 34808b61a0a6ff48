//! Pipeline driver: the document-level entry points.
//!
//! [`process_document`] is the core call: decode, run every frame through
//! the transform chain in page order, return all frames or the first error.
//! There is no partial output; downstream analysis needs every sheet.
//!
//! The other entry points wrap it for the situations a hosting application
//! runs into: an upload held in memory ([`process_upload`]), an async server
//! ([`process_document_async`], [`process_batch`]) and the hand-off to an
//! analysis collaborator ([`analyze_document`]).

use crate::analysis::{Equipment, FrameAnalyzer};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::frame::{lowercase_extension, DocumentFormat, FrameSequence};
use crate::output::{PipelineStats, ProcessedDocument};
use crate::pipeline::{self, decode, encode, input};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Preprocess a PDF or raster P&ID into binary frames.
///
/// # Errors
/// - `NotFound` / `PermissionDenied` for unreadable paths
/// - `UnsupportedFormat` for anything but `.pdf`, `.png`, `.jpg`, `.jpeg`
/// - `Decode` for corrupt documents, `PdfBackendUnavailable` when a PDF is
///   given and no PDFium library can be bound
/// - `InvalidFrame` naming the stage and page that rejected a frame
pub fn process_document(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ProcessedDocument, PipelineError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    info!("Starting preprocessing: {}", path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let source = input::resolve_source(path)?;

    // ── Step 2: Decode ───────────────────────────────────────────────────
    let decode_start = Instant::now();
    let decoded = decode::decode_document(&source, config)?;
    let decode_duration_ms = decode_start.elapsed().as_millis() as u64;
    let total_pages = decoded.len();
    info!("Decoded {} frame(s) in {}ms", total_pages, decode_duration_ms);

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(total_pages);
    }

    // ── Step 3: Transform frames in page order ───────────────────────────
    let transform_start = Instant::now();
    let mut frames = Vec::with_capacity(total_pages);
    for (idx, frame) in decoded.iter().enumerate() {
        let page_num = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_frame_start(page_num, total_pages);
        }

        match pipeline::transform_frame(frame, config) {
            Ok(processed) => {
                debug!(
                    "Page {}/{} processed ({}x{})",
                    page_num,
                    total_pages,
                    processed.width(),
                    processed.height()
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_frame_complete(page_num, total_pages);
                }
                frames.push(processed);
            }
            Err(e) => {
                let err = e.at_page(page_num);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_frame_error(page_num, total_pages, err.to_string());
                }
                return Err(err);
            }
        }
    }
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    let stats = PipelineStats {
        total_pages,
        decode_duration_ms,
        transform_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Preprocessing complete: {} page(s), {}ms total",
        total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(total_pages);
    }

    Ok(ProcessedDocument {
        source,
        frames: FrameSequence::new(frames),
        stats,
    })
}

/// Run [`process_document`] on the tokio blocking pool.
///
/// pdfium and the filter stages are CPU-bound and synchronous; running them
/// on a worker thread would stall every other task on that thread.
pub async fn process_document_async(
    path: impl Into<PathBuf>,
    config: &PipelineConfig,
) -> Result<ProcessedDocument, PipelineError> {
    let path = path.into();
    let config = config.clone();

    tokio::task::spawn_blocking(move || process_document(&path, &config))
        .await
        .map_err(|e| PipelineError::Internal(format!("Pipeline task panicked: {}", e)))?
}

/// Process several independent documents, at most `config.concurrency` at once.
///
/// Results are returned in input order. One failing document does not
/// affect the others.
pub async fn process_batch<I, P>(
    paths: I,
    config: &PipelineConfig,
) -> Vec<Result<ProcessedDocument, PipelineError>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    stream::iter(paths.into_iter().map(|p| process_document_async(p, config)))
        .buffered(config.concurrency.max(1))
        .collect()
        .await
}

/// Preprocess an uploaded file held in memory.
///
/// The bytes are checked against `config.max_file_bytes`, staged in a
/// managed temp file that keeps the original extension, and removed when
/// this call returns. The returned document's source path points at that
/// (already deleted) temp file.
pub fn process_upload(
    bytes: &[u8],
    file_name: &str,
    config: &PipelineConfig,
) -> Result<ProcessedDocument, PipelineError> {
    input::check_size(bytes.len() as u64, config.max_file_bytes)?;

    let extension = lowercase_extension(Path::new(file_name));
    if DocumentFormat::from_extension(&extension).is_none() {
        return Err(PipelineError::UnsupportedFormat {
            path: PathBuf::from(file_name),
            extension,
        });
    }

    let mut tmp = tempfile::Builder::new()
        .prefix("pidprep-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .map_err(|e| PipelineError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| PipelineError::Internal(format!("tempfile write: {e}")))?;

    debug!("Staged upload '{}' at {}", file_name, tmp.path().display());
    // `tmp` is dropped (and the file deleted) after processing
    process_document(tmp.path(), config)
}

/// Preprocess a document and hand every frame to `analyzer`, in page order.
///
/// Returns the processed document and the concatenated equipment list.
pub fn analyze_document(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
    analyzer: &dyn FrameAnalyzer,
) -> Result<(ProcessedDocument, Vec<Equipment>), PipelineError> {
    let document = process_document(path, config)?;
    let equipment = analyze_frames(&document.frames, analyzer)?;
    info!(
        "Analysis returned {} equipment record(s) across {} page(s)",
        equipment.len(),
        document.frames.len()
    );
    Ok((document, equipment))
}

/// Encode and analyze already-processed frames, in page order.
pub fn analyze_frames(
    frames: &FrameSequence,
    analyzer: &dyn FrameAnalyzer,
) -> Result<Vec<Equipment>, PipelineError> {
    let mut equipment = Vec::new();
    for (idx, frame) in frames.iter().enumerate() {
        let page_num = idx + 1;
        let encoded = encode::encode_frame(page_num, frame)?;
        let found = analyzer
            .analyze(&encoded)
            .map_err(|source| PipelineError::Analysis {
                page: page_num,
                source,
            })?;
        debug!("Page {}: {} equipment record(s)", page_num, found.len());
        equipment.extend(found);
    }
    Ok(equipment)
}
