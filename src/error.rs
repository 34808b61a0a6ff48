//! Error types for the pidprep library.
//!
//! Two error types reflect two levels of failure:
//!
//! * [`PipelineError`]: the document as a whole could not be processed
//!   (missing file, unsupported extension, corrupt PDF, missing PDF backend).
//!   Returned as `Err(PipelineError)` from every `process_*` entry point.
//!
//! * [`FrameError`]: a single transform stage rejected the frame it was
//!   handed. Stages return it directly; the pipeline driver wraps it in
//!   [`PipelineError::InvalidFrame`] together with the page it happened on.
//!
//! Nothing is retried. None of these conditions are transient.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Normalize,
    Denoise,
    Binarize,
    Morphology,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Normalize => "normalize",
            Stage::Denoise => "denoise",
            Stage::Binarize => "binarize",
            Stage::Morphology => "morphology",
        };
        f.write_str(name)
    }
}

/// All fatal, per-document errors returned by the pidprep library.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of `.pdf`, `.png`, `.jpg`, `.jpeg`.
    #[error("Unsupported file format '{extension}' for '{path}'\nSupported: .pdf, .png, .jpg, .jpeg")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Upload exceeds the accepted size.
    #[error("File size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The document or image could not be parsed.
    #[error("Failed to decode '{path}'{}: {detail}", page_suffix(.page))]
    Decode {
        path: PathBuf,
        page: Option<usize>,
        detail: String,
    },

    /// A PDF was supplied but no PDFium library could be bound.
    #[error(
        "PDF support is unavailable: {0}\n\n\
Raster inputs (.png, .jpg, .jpeg) still work without it. To enable PDFs:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium, or\n\
  • pass --pdfium-lib / PipelineConfig::pdfium_library.\n"
    )]
    PdfBackendUnavailable(#[from] pdfium_locate::PdfiumLocateError),

    // ── Frame errors ──────────────────────────────────────────────────────
    /// A transform stage rejected the frame for the given page (1-indexed).
    #[error("Page {page}: {source}")]
    InvalidFrame {
        page: usize,
        #[source]
        source: FrameError,
    },

    /// PNG encoding of a processed frame failed.
    #[error("Page {page}: PNG encoding failed: {detail}")]
    Encode { page: usize, detail: String },

    // ── Analysis hand-off ─────────────────────────────────────────────────
    /// The analysis collaborator failed on a page.
    #[error("Page {page}: analysis failed: {source}")]
    Analysis {
        page: usize,
        #[source]
        source: AnalysisError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn page_suffix(page: &Option<usize>) -> String {
    match page {
        Some(p) => format!(" (page {p})"),
        None => String::new(),
    }
}

impl PipelineError {
    /// The stage this error belongs to, when it came from the pipeline proper.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Decode { .. } | PipelineError::PdfBackendUnavailable(_) => {
                Some(Stage::Decode)
            }
            PipelineError::InvalidFrame { source, .. } => Some(source.stage()),
            _ => None,
        }
    }

    /// The 1-indexed page this error belongs to, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            PipelineError::Decode { page, .. } => *page,
            PipelineError::InvalidFrame { page, .. }
            | PipelineError::Encode { page, .. }
            | PipelineError::Analysis { page, .. } => Some(*page),
            _ => None,
        }
    }
}

/// A transform stage received a frame it cannot process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Zero width or height.
    #[error("{stage}: empty {width}x{height} frame")]
    Empty { stage: Stage, width: u32, height: u32 },

    /// Channel count not accepted by the stage.
    #[error("{stage}: expected {expected}, got {actual} channel(s)")]
    ChannelCount {
        stage: Stage,
        expected: &'static str,
        actual: u8,
    },

    /// Raw buffer length does not match `width * height * channels`.
    #[error("{stage}: buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        stage: Stage,
        expected: usize,
        actual: usize,
    },
}

impl FrameError {
    /// The stage that rejected the frame.
    pub fn stage(&self) -> Stage {
        match self {
            FrameError::Empty { stage, .. }
            | FrameError::ChannelCount { stage, .. }
            | FrameError::BufferSize { stage, .. } => *stage,
        }
    }

    /// Attach the page number, producing a document-level error.
    pub fn at_page(self, page: usize) -> PipelineError {
        PipelineError::InvalidFrame { page, source: self }
    }
}

/// Failure reported by, or while talking to, the analysis collaborator.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The collaborator's reply was not the expected JSON shape.
    #[error("invalid analysis response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The collaborator itself failed (network, quota, model error).
    #[error("{0}")]
    Collaborator(String),
}
