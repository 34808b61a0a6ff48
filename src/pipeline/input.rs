//! Input resolution: turn a user-supplied path into a [`SourceDocument`].
//!
//! The checks run in the order a user would debug them: does the file exist,
//! can we read it, is the extension one we handle. Content is only inspected
//! later, by the decoder.

use crate::error::PipelineError;
use crate::frame::SourceDocument;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` names a readable file with a supported extension.
pub fn resolve_source(path: &Path) -> Result<SourceDocument, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }

    // Check read permission by attempting to open
    if let Err(e) = std::fs::File::open(path) {
        return Err(io_error(path, e));
    }

    let source = SourceDocument::from_extension(path)?;
    debug!(
        "Resolved {:?} input: {}",
        source.format(),
        source.path().display()
    );
    Ok(source)
}

/// Reject files larger than `limit` bytes. Returns the file size.
///
/// Callers run this before invoking the pipeline; the pipeline itself does
/// not look at file sizes.
pub fn enforce_size_limit(path: &Path, limit: u64) -> Result<u64, PipelineError> {
    let size = std::fs::metadata(path)
        .map_err(|e| io_error(path, e))?
        .len();
    check_size(size, limit)?;
    Ok(size)
}

/// Size check for an in-memory upload.
pub fn check_size(size: u64, limit: u64) -> Result<(), PipelineError> {
    if size > limit {
        return Err(PipelineError::FileTooLarge { size, limit });
    }
    Ok(())
}

/// Map an I/O error on `path` into the document-level taxonomy.
pub(crate) fn io_error(path: &Path, e: std::io::Error) -> PipelineError {
    let path: PathBuf = path.to_path_buf();
    match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::NotFound { path },
        std::io::ErrorKind::PermissionDenied => PipelineError::PermissionDenied { path },
        _ => PipelineError::Decode {
            path,
            page: None,
            detail: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DocumentFormat;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_source(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_source(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[test]
    fn existing_bmp_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("scan.bmp");
        std::fs::write(&p, b"BM").unwrap();
        let err = resolve_source(&p).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn existing_pdf_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("Sheet-01.Pdf");
        std::fs::write(&p, b"%PDF-1.4").unwrap();
        let src = resolve_source(&p).unwrap();
        assert_eq!(src.format(), DocumentFormat::Pdf);
        assert_eq!(src.path(), p.as_path());
    }

    #[test]
    fn size_limit() {
        assert!(check_size(10, 10).is_ok());
        assert!(matches!(
            check_size(11, 10),
            Err(PipelineError::FileTooLarge { size: 11, limit: 10 })
        ));

        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("big.png");
        std::fs::write(&p, vec![0u8; 2048]).unwrap();
        assert_eq!(enforce_size_limit(&p, 4096).unwrap(), 2048);
        assert!(enforce_size_limit(&p, 1024).is_err());
    }
}
