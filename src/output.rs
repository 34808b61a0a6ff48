//! Result types returned by the pipeline driver.

use crate::frame::{DocumentFormat, FrameSequence, SourceDocument};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A fully processed document: binary frames in page order plus timings.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub source: SourceDocument,
    pub frames: FrameSequence,
    pub stats: PipelineStats,
}

impl ProcessedDocument {
    /// Serialisable description without pixel data.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            path: self.source.path().to_path_buf(),
            format: self.source.format(),
            pages: self
                .frames
                .iter()
                .enumerate()
                .map(|(i, f)| FrameSummary {
                    page_num: i + 1,
                    width: f.width(),
                    height: f.height(),
                })
                .collect(),
            stats: self.stats.clone(),
        }
    }
}

/// Timing and volume for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total_pages: usize,
    pub decode_duration_ms: u64,
    pub transform_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Dimensions of one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub page_num: usize,
    pub width: u32,
    pub height: u32,
}

/// JSON-friendly view of a [`ProcessedDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub pages: Vec<FrameSummary>,
    pub stats: PipelineStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RasterFrame;

    #[test]
    fn summary_lists_pages_in_order() {
        let doc = ProcessedDocument {
            source: SourceDocument::from_extension("p.pdf").unwrap(),
            frames: FrameSequence::new(vec![
                RasterFrame::filled_gray(10, 20, 0),
                RasterFrame::filled_gray(30, 40, 0),
            ]),
            stats: PipelineStats {
                total_pages: 2,
                ..Default::default()
            },
        };
        let s = doc.summary();
        assert_eq!(s.pages.len(), 2);
        assert_eq!(s.pages[1].page_num, 2);
        assert_eq!((s.pages[1].width, s.pages[1].height), (30, 40));

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["format"], "pdf");
        assert_eq!(json["stats"]["total_pages"], 2);
    }
}
