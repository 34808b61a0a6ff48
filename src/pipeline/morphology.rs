//! Morphological closing of binary frames.
//!
//! A pixel counts as ON when it is non-zero. The structuring element is a
//! centred all-ones square of side `kernel_size`, expressed to `imageproc`
//! as a chessboard (L∞) radius of `kernel_size / 2`. Positions outside the
//! frame take no part, so the frame border neither grows nor erodes shapes.

use crate::config::MorphologyParams;
use crate::error::{FrameError, Stage};
use crate::frame::{RasterFrame, OFF, ON};
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use tracing::debug;

/// L∞ radius of a square element; sizes are bounded by config validation.
fn radius(kernel_size: u32) -> u8 {
    u8::try_from(kernel_size / 2).unwrap_or(u8::MAX)
}

/// Copy the frame with every non-zero pixel forced to `ON`.
fn binary_image(frame: &RasterFrame) -> Result<GrayImage, FrameError> {
    let mut image = frame.to_gray_image(Stage::Morphology)?;
    for p in image.iter_mut() {
        if *p != OFF {
            *p = ON;
        }
    }
    Ok(image)
}

/// ON wherever any pixel under the element is ON.
pub fn dilate(frame: &RasterFrame, kernel_size: u32) -> Result<RasterFrame, FrameError> {
    let image = binary_image(frame)?;
    // Without any ON pixel the distance map saturates at w + h, not infinity.
    if image.iter().all(|&p| p == OFF) {
        return Ok(image.into());
    }
    Ok(morphology::dilate(&image, Norm::LInf, radius(kernel_size)).into())
}

/// ON only where every in-frame pixel under the element is ON.
pub fn erode(frame: &RasterFrame, kernel_size: u32) -> Result<RasterFrame, FrameError> {
    let image = binary_image(frame)?;
    if image.iter().all(|&p| p == ON) {
        return Ok(image.into());
    }
    Ok(morphology::erode(&image, Norm::LInf, radius(kernel_size)).into())
}

/// Dilation followed by erosion with the same element.
pub fn close(frame: &RasterFrame, params: &MorphologyParams) -> Result<RasterFrame, FrameError> {
    let dilated = dilate(frame, params.kernel_size)?;
    let closed = erode(&dilated, params.kernel_size)?;
    debug!(
        "Closing {}x{} on {}x{} frame",
        params.kernel_size,
        params.kernel_size,
        frame.width(),
        frame.height()
    );
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::GRAY;

    fn frame_from(rows: &[&str]) -> RasterFrame {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { ON } else { OFF }))
            .collect();
        RasterFrame::from_raw(w, h, GRAY, data).unwrap()
    }

    fn render(frame: &RasterFrame) -> Vec<String> {
        (0..frame.height())
            .map(|y| {
                (0..frame.width())
                    .map(|x| if frame.sample(x, y, 0) == ON { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn all_off_stays_off() {
        let frame = RasterFrame::filled_gray(16, 9, OFF);
        let out = close(&frame, &MorphologyParams::default()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn all_on_stays_on() {
        let frame = RasterFrame::filled_gray(5, 5, ON);
        let out = close(&frame, &MorphologyParams::default()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn dilate_grows_a_single_pixel() {
        let frame = frame_from(&[".....", ".....", "..#..", ".....", "....."]);
        let out = dilate(&frame, 3).unwrap();
        assert_eq!(
            render(&out),
            vec![".....", ".###.", ".###.", ".###.", "....."]
        );
    }

    #[test]
    fn erode_removes_a_single_pixel() {
        let frame = frame_from(&[".....", ".....", "..#..", ".....", "....."]);
        let out = erode(&frame, 3).unwrap();
        assert!(out.as_bytes().iter().all(|&v| v == OFF));
    }

    #[test]
    fn closing_bridges_a_one_pixel_gap() {
        let frame = frame_from(&[
            ".......",
            ".......",
            ".##.##.",
            ".......",
            ".......",
        ]);
        let out = close(&frame, &MorphologyParams::default()).unwrap();
        assert_eq!(out.sample(3, 2, 0), ON, "gap is filled");
        assert_eq!(out.sample(1, 2, 0), ON);
        assert_eq!(out.sample(5, 2, 0), ON);
        assert_eq!(out.sample(3, 0, 0), OFF);
    }

    #[test]
    fn closing_never_erodes_solid_neighbourhoods() {
        let frame = frame_from(&[
            "........",
            ".####...",
            ".####.#.",
            ".####...",
            "........",
        ]);
        let out = close(&frame, &MorphologyParams::default()).unwrap();
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let full = (y.saturating_sub(1)..=(y + 1).min(frame.height() - 1)).all(|sy| {
                    (x.saturating_sub(1)..=(x + 1).min(frame.width() - 1))
                        .all(|sx| frame.sample(sx, sy, 0) == ON)
                });
                if full {
                    assert_eq!(out.sample(x, y, 0), ON, "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn non_zero_counts_as_on() {
        let frame = RasterFrame::filled_gray(3, 3, 7);
        let out = dilate(&frame, 3).unwrap();
        assert!(out.as_bytes().iter().all(|&v| v == ON));
    }

    #[test]
    fn non_zero_pixels_survive_erosion() {
        let frame = RasterFrame::filled_gray(4, 4, 7);
        let out = erode(&frame, 3).unwrap();
        assert!(out.as_bytes().iter().all(|&v| v == ON));
    }

    #[test]
    fn element_wider_than_frame_spreads_everywhere() {
        let frame = frame_from(&["#........"]);
        let out = dilate(&frame, 17).unwrap();
        assert_eq!(render(&out), vec!["#########"]);
    }

    #[test]
    fn oversized_element_keeps_uniform_frames() {
        let off = RasterFrame::filled_gray(3, 3, OFF);
        assert_eq!(dilate(&off, 17).unwrap(), off);
        let on = RasterFrame::filled_gray(3, 3, ON);
        assert_eq!(erode(&on, 17).unwrap(), on);
    }

    #[test]
    fn rejects_rgb() {
        let rgb = RasterFrame::filled_rgb(3, 3, [0, 0, 0]);
        assert!(matches!(
            close(&rgb, &MorphologyParams::default()),
            Err(FrameError::ChannelCount { stage: Stage::Morphology, .. })
        ));
    }
}
