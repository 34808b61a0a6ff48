//! Configuration types for P&ID preprocessing.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The filter parameters default to the values
//! the reference pipeline used (5×5 blur, 11×11 neighbourhood with offset 2,
//! 3×3 closing); they are tunables, not constants, because scan quality
//! varies a lot between drawing sources.

use crate::error::PipelineError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for one pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pidprep::{PipelineConfig, ThresholdMethod};
///
/// let config = PipelineConfig::builder()
///     .dpi(200)
///     .block_size(15)
///     .threshold_method(ThresholdMethod::Mean)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Rendering DPI for PDF pages. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered width or height of a PDF page in pixels. Default: 4000.
    ///
    /// E-size drawings at 150 DPI are already around 6 600 px on the long
    /// edge; the cap keeps memory bounded regardless of sheet size.
    pub max_rendered_pixels: u32,

    /// Location of the PDFium library (file or directory). Default: None.
    ///
    /// When unset the library is looked up via `PDFIUM_LIB_PATH`, the cache
    /// directory and finally the system search path. Only consulted when a
    /// PDF is decoded.
    pub pdfium_library: Option<PathBuf>,

    /// Noise filter parameters.
    pub blur: BlurParams,

    /// Adaptive threshold parameters.
    pub threshold: ThresholdParams,

    /// Morphological closing parameters.
    pub morphology: MorphologyParams,

    /// Largest accepted upload in bytes. Default: 10 MiB.
    ///
    /// Enforced by the callers of the pipeline (`process_upload`, the CLI),
    /// not by [`crate::process_document`] itself.
    pub max_file_bytes: u64,

    /// Documents processed at once by [`crate::process_batch`]. Default: 4.
    pub concurrency: usize,

    /// Optional per-frame progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 4000,
            pdfium_library: None,
            blur: BlurParams::default(),
            threshold: ThresholdParams::default(),
            morphology: MorphologyParams::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_library", &self.pdfium_library)
            .field("blur", &self.blur)
            .field("threshold", &self.threshold)
            .field("morphology", &self.morphology)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn blur_kernel_size(mut self, k: u32) -> Self {
        self.config.blur.kernel_size = k;
        self
    }

    /// Gaussian σ; `None` derives it from the kernel size.
    pub fn blur_sigma(mut self, sigma: Option<f32>) -> Self {
        self.config.blur.sigma = sigma;
        self
    }

    pub fn block_size(mut self, n: u32) -> Self {
        self.config.threshold.block_size = n;
        self
    }

    pub fn threshold_offset(mut self, c: i32) -> Self {
        self.config.threshold.offset = c;
        self
    }

    pub fn threshold_method(mut self, method: ThresholdMethod) -> Self {
        self.config.threshold.method = method;
        self
    }

    pub fn morphology_kernel_size(mut self, k: u32) -> Self {
        self.config.morphology.kernel_size = k;
        self
    }

    pub fn max_file_bytes(mut self, n: u64) -> Self {
        self.config.max_file_bytes = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(PipelineError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        c.blur.validate()?;
        c.threshold.validate()?;
        c.morphology.validate()?;
        if c.max_file_bytes == 0 {
            return Err(PipelineError::InvalidConfig(
                "Maximum file size must be > 0".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(PipelineError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Stage parameters ─────────────────────────────────────────────────────

/// Gaussian smoothing applied before thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurParams {
    /// Odd kernel edge length. Default: 5. A size of 1 disables smoothing.
    pub kernel_size: u32,
    /// Standard deviation. Default: derived from `kernel_size`.
    pub sigma: Option<f32>,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: None,
        }
    }
}

impl BlurParams {
    /// σ actually used: the configured one, or `0.3·((k−1)/2 − 1) + 0.8`.
    pub fn effective_sigma(&self) -> f32 {
        match self.sigma {
            Some(s) if s > 0.0 => s,
            _ => 0.3 * ((self.kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "Blur kernel size must be odd, got {}",
                self.kernel_size
            )));
        }
        if let Some(s) = self.sigma {
            if !s.is_finite() || s <= 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "Blur sigma must be a positive number, got {s}"
                )));
            }
        }
        Ok(())
    }
}

/// How the local threshold is computed over the neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMethod {
    /// Unweighted mean of the block.
    Mean,
    /// Gaussian-weighted mean of the block (default).
    #[default]
    Gaussian,
}

/// Largest useful threshold offset magnitude for 8-bit samples.
pub const MAX_THRESHOLD_OFFSET: i32 = 255;

/// Largest closing element; its radius must fit the `u8` distance map.
pub const MAX_MORPHOLOGY_KERNEL: u32 = 511;

/// Local (adaptive) binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Odd neighbourhood edge length, ≥ 3. Default: 11.
    pub block_size: u32,
    /// Subtracted from the local mean, within ±255. Default: 2.
    pub offset: i32,
    /// Default: [`ThresholdMethod::Gaussian`].
    pub method: ThresholdMethod,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_size: 11,
            offset: 2,
            method: ThresholdMethod::default(),
        }
    }
}

impl ThresholdParams {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "Threshold block size must be odd and ≥ 3, got {}",
                self.block_size
            )));
        }
        if !(-MAX_THRESHOLD_OFFSET..=MAX_THRESHOLD_OFFSET).contains(&self.offset) {
            return Err(PipelineError::InvalidConfig(format!(
                "Threshold offset must be within ±{MAX_THRESHOLD_OFFSET}, got {}",
                self.offset
            )));
        }
        Ok(())
    }
}

/// Square all-ones structuring element used for closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyParams {
    /// Odd element edge length. Default: 3.
    pub kernel_size: u32,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self { kernel_size: 3 }
    }
}

impl MorphologyParams {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "Morphology kernel size must be odd, got {}",
                self.kernel_size
            )));
        }
        if self.kernel_size > MAX_MORPHOLOGY_KERNEL {
            return Err(PipelineError::InvalidConfig(format!(
                "Morphology kernel size must be at most {MAX_MORPHOLOGY_KERNEL}, got {}",
                self.kernel_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pipeline() {
        let c = PipelineConfig::default();
        assert_eq!(c.blur.kernel_size, 5);
        assert_eq!(c.threshold.block_size, 11);
        assert_eq!(c.threshold.offset, 2);
        assert_eq!(c.morphology.kernel_size, 3);
        assert_eq!(c.max_file_bytes, 10 * 1024 * 1024);
        assert!(c.pdfium_library.is_none());
    }

    #[test]
    fn auto_sigma_for_5x5() {
        let sigma = BlurParams::default().effective_sigma();
        assert!((sigma - 1.1).abs() < 1e-6, "got {sigma}");
    }

    #[test]
    fn explicit_sigma_wins() {
        let p = BlurParams {
            kernel_size: 5,
            sigma: Some(2.5),
        };
        assert_eq!(p.effective_sigma(), 2.5);
    }

    #[test]
    fn builder_rejects_even_kernels() {
        assert!(PipelineConfig::builder().blur_kernel_size(4).build().is_err());
        assert!(PipelineConfig::builder()
            .morphology_kernel_size(2)
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_small_block() {
        let err = PipelineConfig::builder().block_size(1).build().unwrap_err();
        assert!(err.to_string().contains("block size"));
        assert!(PipelineConfig::builder().block_size(12).build().is_err());
    }

    #[test]
    fn builder_bounds_threshold_offset() {
        for offset in [i32::MIN, -256, 256, i32::MAX] {
            let err = PipelineConfig::builder()
                .threshold_offset(offset)
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("offset"), "{offset}: {err}");
        }
        for offset in [-255, 0, 255] {
            assert!(PipelineConfig::builder()
                .threshold_offset(offset)
                .build()
                .is_ok());
        }
    }

    #[test]
    fn builder_bounds_morphology_kernel() {
        assert!(PipelineConfig::builder()
            .morphology_kernel_size(511)
            .build()
            .is_ok());
        assert!(PipelineConfig::builder()
            .morphology_kernel_size(513)
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_bad_sigma() {
        assert!(PipelineConfig::builder()
            .blur_sigma(Some(-1.0))
            .build()
            .is_err());
    }

    #[test]
    fn builder_clamps_dpi_and_concurrency() {
        let c = PipelineConfig::builder()
            .dpi(10)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 72);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn threshold_method_serialises_lowercase() {
        let json = serde_json::to_string(&ThresholdMethod::Mean).unwrap();
        assert_eq!(json, "\"mean\"");
    }
}
