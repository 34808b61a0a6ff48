//! Grayscale normalization: any accepted frame → one channel.
//!
//! Luma follows ITU-R BT.601 (`0.299 R + 0.587 G + 0.114 B`) evaluated in
//! 14-bit fixed point, so identical inputs give identical bytes on every
//! platform and uniform gray stays exactly the same value.

use crate::error::{FrameError, Stage};
use crate::frame::{RasterFrame, GRAY, RGB};
use tracing::debug;

const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// BT.601 luma of one RGB pixel.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = R_WEIGHT * r as u32 + G_WEIGHT * g as u32 + B_WEIGHT * b as u32 + (1 << (SHIFT - 1));
    (y >> SHIFT) as u8
}

/// Convert a frame to a new single-channel frame.
///
/// Grayscale input is copied unchanged.
pub fn to_grayscale(frame: &RasterFrame) -> Result<RasterFrame, FrameError> {
    frame.ensure_non_empty(Stage::Normalize)?;
    match frame.channels() {
        GRAY => Ok(frame.clone()),
        RGB => {
            let data: Vec<u8> = frame
                .as_bytes()
                .chunks_exact(3)
                .map(|px| luma(px[0], px[1], px[2]))
                .collect();
            debug!("Normalized {}x{} RGB → gray", frame.width(), frame.height());
            RasterFrame::from_stage_output(
                Stage::Normalize,
                frame.width(),
                frame.height(),
                GRAY,
                data,
            )
        }
        other => Err(FrameError::ChannelCount {
            stage: Stage::Normalize,
            expected: "1 or 3",
            actual: other,
        }),
    }
}
