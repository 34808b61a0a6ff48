//! Progress-callback trait for per-frame pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the driver moves through a document. The CLI uses this to drive
//! its progress bar; a web host could forward the same events to a socket.
//!
//! # Example
//!
//! ```rust
//! use pidprep::{PipelineProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_frame_complete(&self, page_num: usize, total_pages: usize) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("page {page_num}/{total_pages} done ({n} so far)");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline driver as it processes a document.
///
/// All methods default to no-ops. Implementations must be `Send + Sync`:
/// [`crate::process_batch`] runs several documents at once, and they all
/// share the callback held by the config.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once the document has been decoded.
    ///
    /// # Arguments
    /// * `total_pages`: number of frames that will be transformed
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before the transform chain runs on a frame (1-indexed page).
    fn on_frame_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a frame has passed every stage.
    fn on_frame_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a frame fails. The document is aborted right after.
    fn on_frame_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once every frame has been processed successfully.
    fn on_document_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Shared handle stored in the config.
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
