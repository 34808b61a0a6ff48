//! Frame encoding: processed `RasterFrame` → PNG bytes for transport.
//!
//! Out-of-process analysis (a vision model behind an HTTP API) takes images
//! as base64 `data:` URIs. Frames are always PNG so binary levels survive
//! transport unchanged.

use crate::error::PipelineError;
use crate::frame::RasterFrame;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use tracing::debug;

/// MIME type of [`EncodedFrame::png`].
pub const PNG_MIME: &str = "image/png";

/// A processed frame encoded as PNG, tagged with its 1-indexed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub page_num: usize,
    pub png: Vec<u8>,
}

impl EncodedFrame {
    /// Standard base64 of the PNG bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    /// `data:image/png;base64,...` URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", PNG_MIME, self.to_base64())
    }
}

/// Encode a frame as PNG.
pub fn encode_frame(page_num: usize, frame: &RasterFrame) -> Result<EncodedFrame, PipelineError> {
    let encode_err = |detail: String| PipelineError::Encode { page: page_num, detail };

    let img = frame
        .to_dynamic_image()
        .map_err(|e| encode_err(e.to_string()))?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| encode_err(e.to_string()))?;

    debug!("Encoded page {} → {} bytes PNG", page_num, buf.len());
    Ok(EncodedFrame { page_num, png: buf })
}
