//! Document decoding: PDF pages via pdfium, raster images via `image`.
//!
//! Every decoded frame is three-channel RGB, one per PDF page in page order
//! or exactly one for a raster image.
//!
//! A file that does not start with `%PDF` is reported as a decode error
//! before pdfium is bound, whether or not a PDFium library is installed.

use super::input::io_error;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::frame::{DocumentFormat, FrameSequence, RasterFrame, SourceDocument};
use image::ImageReader;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Decode a source document into frames.
pub fn decode_document(
    source: &SourceDocument,
    config: &PipelineConfig,
) -> Result<FrameSequence, PipelineError> {
    match source.format() {
        DocumentFormat::Pdf => decode_pdf(source.path(), config),
        DocumentFormat::RasterImage => {
            decode_raster(source.path()).map(|frame| FrameSequence::new(vec![frame]))
        }
    }
}

/// Decode a single raster image, converting it to RGB.
pub fn decode_raster(path: &Path) -> Result<RasterFrame, PipelineError> {
    let decode_err = |detail: String| PipelineError::Decode {
        path: path.to_path_buf(),
        page: None,
        detail,
    };

    let image = ImageReader::open(path)
        .map_err(|e| io_error(path, e))?
        .with_guessed_format()
        .map_err(|e| io_error(path, e))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(decode_err("image has zero width or height".into()));
    }

    debug!(
        "Decoded {} → {}x{} ({:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(RasterFrame::from(image.to_rgb8()))
}

/// Verify the file starts with the `%PDF` signature.
fn check_pdf_signature(path: &Path) -> Result<(), PipelineError> {
    let mut f = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let mut magic = [0u8; 4];
    match f.read_exact(&mut magic) {
        Ok(()) if &magic == PDF_MAGIC => Ok(()),
        Ok(()) => Err(PipelineError::Decode {
            path: path.to_path_buf(),
            page: None,
            detail: format!("not a PDF, first bytes: {magic:?}"),
        }),
        Err(_) => Err(PipelineError::Decode {
            path: path.to_path_buf(),
            page: None,
            detail: "file is too short to be a PDF".into(),
        }),
    }
}

/// Render every page of a PDF, in page order.
fn decode_pdf(path: &Path, config: &PipelineConfig) -> Result<FrameSequence, PipelineError> {
    check_pdf_signature(path)?;

    // One binding for the whole process; dropping a Pdfium tears PDFium down.
    let pdfium = pdfium_locate::shared_pdfium(config.pdfium_library.as_deref())?;

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            page: None,
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages == 0 {
        return Err(PipelineError::Decode {
            path: path.to_path_buf(),
            page: None,
            detail: "document has no pages".into(),
        });
    }
    info!("PDF loaded: {} pages", total_pages);

    let max_px = config.max_rendered_pixels as i32;
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(config.dpi as f32 / 72.0)
        .set_maximum_width(max_px)
        .set_maximum_height(max_px);

    let mut frames = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                page: Some(idx + 1),
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        frames.push(RasterFrame::from(image.to_rgb8()));
    }

    Ok(FrameSequence::new(frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn png_with_alpha_becomes_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("sym.png");
        RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 128]))
            .save(&p)
            .unwrap();

        let frame = decode_raster(&p).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (6, 4, 3));
        assert_eq!(frame.as_bytes()[..3], [10, 20, 30]);
    }

    #[test]
    fn grayscale_png_becomes_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("gray.png");
        GrayImage::from_pixel(3, 3, Luma([90])).save(&p).unwrap();

        let frame = decode_raster(&p).unwrap();
        assert_eq!(frame.channels(), 3);
        assert!(frame.as_bytes().iter().all(|&v| v == 90));
    }

    #[test]
    fn garbage_jpeg_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.jpg");
        std::fs::write(&p, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            decode_raster(&p),
            Err(PipelineError::Decode { page: None, .. })
        ));
    }

    #[test]
    fn pdf_signature_is_checked_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("fake.pdf");
        std::fs::write(&p, b"PK\x03\x04 zip archive").unwrap();
        let err = check_pdf_signature(&p).unwrap_err();
        assert!(err.to_string().contains("not a PDF"), "got: {err}");

        std::fs::write(&p, b"%P").unwrap();
        assert!(check_pdf_signature(&p).is_err());

        std::fs::write(&p, b"%PDF-1.7\n").unwrap();
        assert!(check_pdf_signature(&p).is_ok());
    }
}
