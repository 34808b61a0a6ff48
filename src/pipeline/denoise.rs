//! Gaussian noise filter.
//!
//! Suppresses sensor noise and JPEG ringing before thresholding. Borders
//! replicate the edge pixel.

use super::kernel::{gaussian_kernel, round_to_gray, weighted_mean};
use crate::config::BlurParams;
use crate::error::{FrameError, Stage};
use crate::frame::RasterFrame;
use tracing::debug;

/// Smooth a grayscale frame with a separable Gaussian kernel.
pub fn gaussian_blur(frame: &RasterFrame, params: &BlurParams) -> Result<RasterFrame, FrameError> {
    let image = frame.to_gray_image(Stage::Denoise)?;

    let sigma = params.effective_sigma();
    let kernel = gaussian_kernel(params.kernel_size, sigma);
    let blurred = round_to_gray(&weighted_mean(&image, &kernel));

    debug!(
        "Gaussian blur {}x{} (σ={:.2}) on {}x{} frame",
        params.kernel_size,
        params.kernel_size,
        sigma,
        frame.width(),
        frame.height()
    );
    Ok(RasterFrame::from(blurred))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{GRAY, RGB};

    #[test]
    fn uniform_frame_is_unchanged() {
        let frame = RasterFrame::filled_gray(20, 10, 200);
        let out = gaussian_blur(&frame, &BlurParams::default()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn isolated_spike_is_attenuated() {
        let mut data = vec![0u8; 9 * 9];
        data[4 * 9 + 4] = 255;
        let frame = RasterFrame::from_raw(9, 9, GRAY, data).unwrap();
        let out = gaussian_blur(&frame, &BlurParams::default()).unwrap();
        let centre = out.sample(4, 4, 0);
        assert!(centre < 255 && centre > 0, "centre = {centre}");
        assert!(out.sample(5, 4, 0) > 0, "energy spreads to neighbours");
        assert_eq!(out.sample(0, 0, 0), 0, "5x5 kernel does not reach the corner");
    }

    #[test]
    fn bright_edge_column_is_replicated_outward() {
        // Only column 0 is lit; its off-frame taps repeat 255 instead of
        // mirroring the dark interior.
        let data: Vec<u8> = (0..25).map(|i| if i % 5 == 0 { 255 } else { 0 }).collect();
        let frame = RasterFrame::from_raw(5, 5, GRAY, data).unwrap();
        let out = gaussian_blur(&frame, &BlurParams::default()).unwrap();
        for y in 0..5 {
            let edge = out.sample(0, y, 0);
            assert!(edge > 128, "edge at y={y} is {edge}");
            assert!(out.sample(4, y, 0) < 10);
        }
    }

    #[test]
    fn kernel_size_one_is_identity() {
        let data: Vec<u8> = (0..16).map(|i| i * 15).collect();
        let frame = RasterFrame::from_raw(4, 4, GRAY, data).unwrap();
        let params = BlurParams {
            kernel_size: 1,
            sigma: None,
        };
        assert_eq!(gaussian_blur(&frame, &params).unwrap(), frame);
    }

    #[test]
    fn rejects_rgb_and_empty() {
        let rgb = RasterFrame::filled_rgb(2, 2, [1, 2, 3]);
        assert!(matches!(
            gaussian_blur(&rgb, &BlurParams::default()),
            Err(FrameError::ChannelCount { stage: Stage::Denoise, actual: RGB, .. })
        ));
        let empty = RasterFrame::filled_gray(0, 0, 0);
        assert!(matches!(
            gaussian_blur(&empty, &BlurParams::default()),
            Err(FrameError::Empty { stage: Stage::Denoise, .. })
        ));
    }
}
