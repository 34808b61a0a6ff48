//! Pipeline stages for P&ID preprocessing.
//!
//! Each submodule implements exactly one step, as a pure function from a
//! borrowed frame to a new owned frame. Nothing is mutated across stage
//! boundaries, so each stage is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ normalize ──▶ denoise ──▶ binarize ──▶ morphology ──▶ encode
//! (path)   (pdfium/   (RGB→gray)   (Gaussian)  (adaptive)   (closing)     (PNG)
//!           image)
//! ```
//!
//! 1. [`input`]: validate the path and derive the format tag
//! 2. [`decode`]: one RGB frame per PDF page, or one for a raster image
//! 3. [`normalize`]: BT.601 grayscale
//! 4. [`denoise`]: Gaussian smoothing, replicate borders
//! 5. [`binarize`]: local mean threshold with offset
//! 6. [`morphology`]: dilation then erosion
//! 7. [`encode`]: PNG bytes for the analysis collaborator

pub mod binarize;
pub mod decode;
pub mod denoise;
pub mod encode;
pub mod input;
pub mod kernel;
pub mod morphology;
pub mod normalize;

use crate::config::PipelineConfig;
use crate::error::FrameError;
use crate::frame::RasterFrame;

/// Run the four transform stages on one decoded frame.
pub fn transform_frame(
    frame: &RasterFrame,
    config: &PipelineConfig,
) -> Result<RasterFrame, FrameError> {
    let gray = normalize::to_grayscale(frame)?;
    let smooth = denoise::gaussian_blur(&gray, &config.blur)?;
    let binary = binarize::adaptive_threshold(&smooth, &config.threshold)?;
    morphology::close(&binary, &config.morphology)
}
