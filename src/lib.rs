//! # pidprep
//!
//! Turn uploaded piping-and-instrumentation diagrams (P&IDs) into clean,
//! binary raster frames ready for symbol analysis.
//!
//! ## Why preprocess at all?
//!
//! P&IDs arrive as vector PDFs exported from CAD, as multi-sheet scans, or as
//! phone photos of a printout. Vision models do noticeably better on a
//! high-contrast black-and-white rendering than on a grey, unevenly lit scan
//! with JPEG noise, so every page is normalised the same way before it is
//! handed off.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / PNG / JPEG
//!  │
//!  ├─ 1. Input      existence, permissions, extension → format tag
//!  ├─ 2. Decode     pdfium per page, or `image` for rasters → RGB frames
//!  ├─ 3. Normalize  BT.601 grayscale
//!  ├─ 4. Denoise    5×5 Gaussian
//!  ├─ 5. Binarize   11×11 adaptive threshold, offset 2
//!  ├─ 6. Close      3×3 dilation + erosion
//!  └─ 7. Hand-off   ordered binary frames (optionally PNG) to the analyzer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pidprep::{process_document, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let doc = process_document("unit-100.pdf", &config)?;
//!     for (i, frame) in doc.frames.iter().enumerate() {
//!         println!("page {}: {}x{}", i + 1, frame.width(), frame.height());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## PDF support
//!
//! PDF pages are rendered with PDFium. The library is located at runtime
//! (see [`pdfium_locate`]); raster inputs work without it, and a PDF input
//! without it fails with [`PipelineError::PdfBackendUnavailable`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pidprep` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod error;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{parse_equipment_response, Equipment, EquipmentReport, FrameAnalyzer};
pub use config::{
    BlurParams, MorphologyParams, PipelineConfig, PipelineConfigBuilder, ThresholdMethod,
    ThresholdParams, DEFAULT_MAX_FILE_BYTES,
};
pub use error::{AnalysisError, FrameError, PipelineError, Stage};
pub use frame::{DocumentFormat, FrameSequence, RasterFrame, SourceDocument};
pub use output::{DocumentSummary, FrameSummary, PipelineStats, ProcessedDocument};
pub use pipeline::encode::{encode_frame, EncodedFrame};
pub use pipeline::input::enforce_size_limit;
pub use pipeline::transform_frame;
pub use process::{
    analyze_document, analyze_frames, process_batch, process_document, process_document_async,
    process_upload,
};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
