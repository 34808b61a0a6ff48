//! Core data types: raster frames, frame sequences and source documents.

use crate::error::{FrameError, PipelineError, Stage};
use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Channel count of a grayscale frame.
pub const GRAY: u8 = 1;
/// Channel count of an RGB frame.
pub const RGB: u8 = 3;

/// Pixel level of an "on" pixel in a binary frame.
pub const ON: u8 = 255;
/// Pixel level of an "off" pixel in a binary frame.
pub const OFF: u8 = 0;

/// An owned grid of 8-bit samples, row-major, channels interleaved.
///
/// Frames produced by the decoder always have non-zero dimensions and one or
/// three channels. Frames built with [`RasterFrame::from_raw`] are only
/// checked for a consistent buffer length; each transform stage validates
/// the rest.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterFrame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl std::fmt::Debug for RasterFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl RasterFrame {
    /// Wrap a raw interleaved buffer.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, FrameError> {
        Self::from_stage_output(Stage::Decode, width, height, channels, data)
    }

    /// Wrap a buffer produced by `stage`; a length mismatch is reported
    /// against that stage.
    pub(crate) fn from_stage_output(
        stage: Stage,
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                stage,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A single-channel frame with every pixel set to `value`.
    pub fn filled_gray(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            channels: GRAY,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// A three-channel frame with every pixel set to `rgb`.
    pub fn filled_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            channels: RGB,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved samples.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Sample at `(x, y)` for channel `c`. Panics when out of bounds.
    pub fn sample(&self, x: u32, y: u32, c: u8) -> u8 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels as usize + c as usize;
        self.data[idx]
    }

    /// Reject empty frames and frames that are not single-channel.
    pub(crate) fn ensure_gray(&self, stage: Stage) -> Result<(), FrameError> {
        self.ensure_non_empty(stage)?;
        if self.channels != GRAY {
            return Err(FrameError::ChannelCount {
                stage,
                expected: "1",
                actual: self.channels,
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_non_empty(&self, stage: Stage) -> Result<(), FrameError> {
        if self.is_empty() {
            return Err(FrameError::Empty {
                stage,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Copy a single-channel frame into a `GrayImage` for the filter stages.
    pub(crate) fn to_gray_image(&self, stage: Stage) -> Result<GrayImage, FrameError> {
        self.ensure_gray(stage)?;
        let actual = self.data.len();
        GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            FrameError::BufferSize {
                stage,
                expected: self.width as usize * self.height as usize,
                actual,
            },
        )
    }

    /// Convert to an `image` buffer for encoding.
    pub fn to_dynamic_image(&self) -> Result<DynamicImage, FrameError> {
        let mismatch = || FrameError::ChannelCount {
            stage: Stage::Decode,
            expected: "1 or 3",
            actual: self.channels,
        };
        match self.channels {
            GRAY => GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch),
            RGB => RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        }
    }
}

impl From<RgbImage> for RasterFrame {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: RGB,
            data: img.into_raw(),
        }
    }
}

impl From<GrayImage> for RasterFrame {
    fn from(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: GRAY,
            data: img.into_raw(),
        }
    }
}

/// Frames in document page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<RasterFrame>,
}

impl FrameSequence {
    pub fn new(frames: Vec<RasterFrame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame for a 1-indexed page number.
    pub fn page(&self, page_num: usize) -> Option<&RasterFrame> {
        page_num.checked_sub(1).and_then(|i| self.frames.get(i))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RasterFrame> {
        self.frames.iter()
    }
}

impl FromIterator<RasterFrame> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = RasterFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FrameSequence {
    type Item = RasterFrame;
    type IntoIter = std::vec::IntoIter<RasterFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a RasterFrame;
    type IntoIter = std::slice::Iter<'a, RasterFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// How a source document is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentFormat {
    Pdf,
    RasterImage,
}

impl DocumentFormat {
    /// Format tag for a lower-cased extension without the dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentFormat::Pdf),
            "png" | "jpg" | "jpeg" => Some(DocumentFormat::RasterImage),
            _ => None,
        }
    }
}

/// A read-only input document: path plus the format implied by its extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    path: PathBuf,
    format: DocumentFormat,
}

impl SourceDocument {
    /// Derive the format from the extension alone; the file is not touched.
    pub fn from_extension(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        let extension = lowercase_extension(&path);
        match DocumentFormat::from_extension(&extension) {
            Some(format) => Ok(Self { path, format }),
            None => Err(PipelineError::UnsupportedFormat { path, extension }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Lower-cased extension without the leading dot, empty when absent.
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_length() {
        assert!(RasterFrame::from_raw(2, 2, GRAY, vec![0; 4]).is_ok());
        let err = RasterFrame::from_raw(2, 2, RGB, vec![0; 4]).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferSize {
                stage: Stage::Decode,
                expected: 12,
                actual: 4
            }
        );
    }

    #[test]
    fn stage_output_mismatch_names_the_stage() {
        let err = RasterFrame::from_stage_output(Stage::Binarize, 3, 2, GRAY, vec![0; 5]).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferSize {
                stage: Stage::Binarize,
                expected: 6,
                actual: 5
            }
        );
        let err = RasterFrame::from_stage_output(Stage::Normalize, 1, 1, GRAY, vec![]).unwrap_err();
        assert!(matches!(err, FrameError::BufferSize { stage: Stage::Normalize, .. }));
    }

    #[test]
    fn gray_image_bridge_checks_channels() {
        let f = RasterFrame::filled_gray(4, 2, 9);
        let img = f.to_gray_image(Stage::Denoise).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(RasterFrame::from(img), f);

        let rgb = RasterFrame::filled_rgb(2, 2, [1, 2, 3]);
        assert!(matches!(
            rgb.to_gray_image(Stage::Morphology),
            Err(FrameError::ChannelCount { stage: Stage::Morphology, .. })
        ));
    }

    #[test]
    fn filled_rgb_interleaves() {
        let f = RasterFrame::filled_rgb(2, 1, [1, 2, 3]);
        assert_eq!(f.as_bytes(), &[1, 2, 3, 1, 2, 3]);
        assert_eq!(f.sample(1, 0, 2), 3);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let doc = SourceDocument::from_extension("Drawing.PDF").unwrap();
        assert_eq!(doc.format(), DocumentFormat::Pdf);
        let doc = SourceDocument::from_extension("scan.JpEg").unwrap();
        assert_eq!(doc.format(), DocumentFormat::RasterImage);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = SourceDocument::from_extension("scan.bmp").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedFormat { ref extension, .. } if extension == "bmp"
        ));
        assert!(SourceDocument::from_extension("no_extension").is_err());
    }

    #[test]
    fn page_lookup_is_one_indexed() {
        let seq: FrameSequence = vec![
            RasterFrame::filled_gray(1, 1, 10),
            RasterFrame::filled_gray(1, 1, 20),
        ]
        .into_iter()
        .collect();
        assert_eq!(seq.page(1).unwrap().sample(0, 0, 0), 10);
        assert_eq!(seq.page(2).unwrap().sample(0, 0, 0), 20);
        assert!(seq.page(0).is_none());
        assert!(seq.page(3).is_none());
    }

    #[test]
    fn dynamic_image_round_trip_gray() {
        let f = RasterFrame::filled_gray(3, 2, 77);
        let img = f.to_dynamic_image().unwrap();
        assert_eq!(RasterFrame::from(img.to_luma8()), f);
    }
}
