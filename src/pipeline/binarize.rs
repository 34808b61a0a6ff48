//! Adaptive (local) binarization.
//!
//! P&ID scans are rarely lit evenly: a single global cutoff that works in the
//! middle of the sheet loses faint linework near a shadowed fold. Each pixel
//! is instead compared with the mean of its own `block_size × block_size`
//! neighbourhood:
//!
//! ```text
//! dst(x, y) = ON   if src(x, y) > round(mean(x, y)) − offset
//!             OFF  otherwise
//! ```
//!
//! The neighbourhood mean is either a plain box mean or a Gaussian-weighted
//! one. Out-of-frame neighbours replicate the nearest edge pixel.

use super::kernel::{box_kernel, gaussian_kernel, saturate_u8, weighted_mean};
use crate::config::{BlurParams, ThresholdMethod, ThresholdParams};
use crate::error::{FrameError, Stage};
use crate::frame::{RasterFrame, GRAY, OFF, ON};
use tracing::debug;

/// Binarize a grayscale frame into `ON`/`OFF` levels.
pub fn adaptive_threshold(
    frame: &RasterFrame,
    params: &ThresholdParams,
) -> Result<RasterFrame, FrameError> {
    let image = frame.to_gray_image(Stage::Binarize)?;

    let kernel = match params.method {
        ThresholdMethod::Mean => box_kernel(params.block_size),
        ThresholdMethod::Gaussian => {
            let sigma = BlurParams {
                kernel_size: params.block_size,
                sigma: None,
            }
            .effective_sigma();
            gaussian_kernel(params.block_size, sigma)
        }
    };
    let means = weighted_mean(&image, &kernel);

    let data: Vec<u8> = image
        .iter()
        .zip(means.iter())
        .map(|(&src, &mean)| {
            let threshold = i32::from(saturate_u8(mean)).saturating_sub(params.offset);
            if i32::from(src) > threshold {
                ON
            } else {
                OFF
            }
        })
        .collect();

    debug!(
        "Adaptive threshold ({:?}, block={}, offset={}) on {}x{} frame",
        params.method,
        params.block_size,
        params.offset,
        frame.width(),
        frame.height()
    );
    RasterFrame::from_stage_output(Stage::Binarize, frame.width(), frame.height(), GRAY, data)
}
