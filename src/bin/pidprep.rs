//! CLI binary for pidprep.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig`, optionally writes one PNG per page and prints a
//! summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pidprep::{
    encode_frame, enforce_size_limit, process_document_async, FrameSequence, PipelineConfig,
    PipelineProgressCallback, ProgressCallback, ThresholdMethod,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per processed page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_document_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Decoding");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
    }

    fn elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_frame_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_frame_complete(&self, page_num: usize, total: usize) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{elapsed_ms}ms")),
        ));
        self.bar.inc(1);
    }

    fn on_frame_error(&self, page_num: usize, total: usize, error: String) {
        self.elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&error),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preprocess a P&ID and print a summary
  pidprep unit-100.pdf

  # Higher resolution render into a chosen directory
  pidprep --dpi 300 -o frames/ unit-100.pdf

  # Photo of a printout: larger neighbourhood, stronger offset
  pidprep --block-size 31 --offset 8 -o frames/ photo.jpg

  # Machine-readable summary
  pidprep --json unit-100.pdf > summary.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  PDFIUM_CACHE_DIR  Directory searched for libpdfium when PDFIUM_LIB_PATH is unset
  RUST_LOG          Override the tracing filter
"#;

/// Normalize P&ID drawings into clean binary frames.
#[derive(Parser, Debug)]
#[command(
    name = "pidprep",
    version,
    about = "Normalize P&ID drawings (PDF, PNG, JPEG) into clean binary frames",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF, PNG or JPEG file.
    input: PathBuf,

    /// Write `page-NNN.png` for every frame into this directory.
    #[arg(short, long, env = "PIDPREP_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// PDF rendering DPI (72–400).
    #[arg(long, env = "PIDPREP_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Maximum rendered page edge in pixels.
    #[arg(long, env = "PIDPREP_MAX_PIXELS", default_value_t = 4000)]
    max_pixels: u32,

    /// Gaussian blur kernel size (odd).
    #[arg(long, env = "PIDPREP_BLUR_KERNEL", default_value_t = 5)]
    blur_kernel: u32,

    /// Gaussian σ. Derived from the kernel size when omitted.
    #[arg(long, env = "PIDPREP_BLUR_SIGMA")]
    blur_sigma: Option<f32>,

    /// Adaptive threshold block size (odd, ≥ 3).
    #[arg(long, env = "PIDPREP_BLOCK_SIZE", default_value_t = 11)]
    block_size: u32,

    /// Constant subtracted from the local mean.
    #[arg(long, env = "PIDPREP_OFFSET", default_value_t = 2, allow_negative_numbers = true)]
    offset: i32,

    /// Local mean weighting.
    #[arg(long, env = "PIDPREP_THRESHOLD_METHOD", value_enum, default_value = "gaussian")]
    threshold_method: MethodArg,

    /// Closing structuring element size (odd).
    #[arg(long, env = "PIDPREP_MORPH_KERNEL", default_value_t = 3)]
    morph_kernel: u32,

    /// Reject inputs larger than this many MiB.
    #[arg(long, env = "PIDPREP_MAX_FILE_MIB", default_value_t = 10)]
    max_file_mib: u64,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print a JSON summary on stdout instead of text.
    #[arg(long, env = "PIDPREP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PIDPREP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIDPREP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PIDPREP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    Mean,
    Gaussian,
}

impl From<MethodArg> for ThresholdMethod {
    fn from(v: MethodArg) -> Self {
        match v {
            MethodArg::Mean => ThresholdMethod::Mean,
            MethodArg::Gaussian => ThresholdMethod::Gaussian,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    enforce_size_limit(&cli.input, config.max_file_bytes)
        .with_context(|| format!("Cannot accept {}", cli.input.display()))?;

    let doc = process_document_async(cli.input.clone(), &config)
        .await
        .with_context(|| format!("Preprocessing {} failed", cli.input.display()))?;

    // ── Write frames ─────────────────────────────────────────────────────
    let written = match cli.out_dir {
        Some(ref dir) => write_frames(dir, &doc.frames)?,
        None => Vec::new(),
    };

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&doc.summary())
            .context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        let target = match cli.out_dir {
            Some(ref dir) => bold(&dir.display().to_string()),
            None => dim("(not written, pass -o DIR)"),
        };
        eprintln!(
            "{}  {} page(s)  {}ms  →  {}",
            green("✔"),
            doc.stats.total_pages,
            doc.stats.total_duration_ms,
            target,
        );
        for (idx, frame) in doc.frames.iter().enumerate() {
            let label = written
                .get(idx)
                .map(|p: &PathBuf| p.display().to_string())
                .unwrap_or_else(|| format!("page {}", idx + 1));
            eprintln!(
                "   {}  {}",
                label,
                dim(&format!("{}x{}", frame.width(), frame.height()))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .blur_kernel_size(cli.blur_kernel)
        .blur_sigma(cli.blur_sigma)
        .block_size(cli.block_size)
        .threshold_offset(cli.offset)
        .threshold_method(cli.threshold_method.into())
        .morphology_kernel_size(cli.morph_kernel)
        .max_file_bytes(cli.max_file_mib.saturating_mul(1024 * 1024));

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Encode each frame as `page-NNN.png` under `dir`.
fn write_frames(dir: &Path, frames: &FrameSequence) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::with_capacity(frames.len());
    for (idx, frame) in frames.iter().enumerate() {
        let page_num = idx + 1;
        let encoded = encode_frame(page_num, frame)?;
        let path = dir.join(format!("page-{page_num:03}.png"));
        std::fs::write(&path, &encoded.png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
