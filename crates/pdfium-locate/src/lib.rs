//! # pdfium-locate
//!
//! Find a [PDFium](https://pdfium.googlesource.com/pdfium/) shared library
//! on the local machine and bind `pdfium-render` to it, without requiring
//! callers to juggle `LD_LIBRARY_PATH` / `DYLD_LIBRARY_PATH`.
//!
//! ## Lookup order
//!
//! [`locate_pdfium_library`] checks, first match wins:
//!
//! 1. An explicit path supplied by the caller. It may name the library file
//!    itself or a directory that contains the platform library.
//! 2. `PDFIUM_LIB_PATH`, with the same file-or-directory rules.
//! 3. The per-user cache directory, see [`pdfium_cache_dir`].
//!
//! [`shared_pdfium`] additionally falls back to the system library search
//! path when none of the above yields a file.
//!
//! The implicit part of the lookup (steps 2 and 3) is resolved once per
//! process and remembered.
//!
//! ## One binding per process
//!
//! PDFium keeps global state. Creating a `Pdfium` initialises the library and
//! dropping one tears it down for every other holder, so concurrent renders
//! must share a single instance. [`shared_pdfium`] binds on first use and
//! hands out the same `&'static Pdfium` from then on. The first successful
//! call decides which library file is loaded.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfium_locate::{locate_pdfium_library, shared_pdfium};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), pdfium_locate::PdfiumLocateError> {
//! // Bind whatever is available (configured path, env, cache, system).
//! let pdfium = shared_pdfium(None)?;
//!
//! // Or only resolve an explicit location.
//! let path = locate_pdfium_library(Some(Path::new("/opt/pdfium/lib")))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform library names
//!
//! | OS      | Library               |
//! |---------|-----------------------|
//! | macOS   | `libpdfium.dylib`     |
//! | Linux   | `libpdfium.so`        |
//! | Windows | `pdfium.dll`          |

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pdfium-binaries release the cache layout is keyed on.
pub const PDFIUM_VERSION: &str = "7690";

/// Environment variable naming an existing pdfium library (file or directory).
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache directory root.
pub const CACHE_DIR_ENV: &str = "PDFIUM_CACHE_DIR";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-locate operations.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    /// The current OS has no known pdfium library name.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No library file was found at any candidate location.
    #[error("PDFium library not found; searched: {}", SearchList(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// `pdfium-render` could not load the library at `path`.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// Neither a located file nor the system library could be bound.
    #[error("PDFium is not installed ({searched} candidate paths missing) and the system library could not be loaded: {reason}")]
    SystemBind { searched: usize, reason: String },
}

struct SearchList<'a>(&'a [PathBuf]);

impl fmt::Display for SearchList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(no candidates)");
        }
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}'", p.display())?;
        }
        Ok(())
    }
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// File name of the pdfium shared library on the current platform.
pub fn platform_library_name() -> Result<&'static str, PdfiumLocateError> {
    match std::env::consts::OS {
        "macos" => Ok("libpdfium.dylib"),
        "linux" | "freebsd" | "android" => Ok("libpdfium.so"),
        "windows" => Ok("pdfium.dll"),
        os => Err(PdfiumLocateError::UnsupportedPlatform {
            os: os.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }),
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the per-version cache directory searched for the library.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pidprep/pdfium-{VERSION}/`
/// - **Linux**: `~/.cache/pidprep/pdfium-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\pidprep\pdfium-{VERSION}\`
///
/// Override the root by setting `PDFIUM_CACHE_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    cache_dir_from(non_empty_env(CACHE_DIR_ENV))
}

fn cache_dir_from(root_override: Option<PathBuf>) -> PathBuf {
    let root = root_override.unwrap_or_else(|| {
        dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("pidprep")
    });
    root.join(format!("pdfium-{PDFIUM_VERSION}"))
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Turn a file-or-directory candidate into the library file path.
fn library_file(candidate: &Path, lib_name: &str) -> PathBuf {
    if candidate.is_dir() {
        candidate.join(lib_name)
    } else {
        candidate.to_path_buf()
    }
}

// ── Process-wide state ───────────────────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

static SHARED: OnceLock<SharedPdfium> = OnceLock::new();

/// Serialises first-time binding so only one `Pdfium` is ever created.
static BIND_LOCK: Mutex<()> = Mutex::new(());

struct SharedPdfium {
    pdfium: Pdfium,
    /// `None` when bound to the system library.
    source: Option<PathBuf>,
}

impl SharedPdfium {
    fn reuse(&self, explicit: Option<&Path>) -> &Pdfium {
        if let Some(requested) = explicit {
            let same = matches!(&self.source, Some(bound) if bound.starts_with(requested));
            if !same {
                let bound = match &self.source {
                    Some(path) => format!("'{}'", path.display()),
                    None => "the system library".to_string(),
                };
                warn!(
                    "PDFium is already bound from {bound}; ignoring '{}'",
                    requested.display()
                );
            }
        }
        &self.pdfium
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the on-disk pdfium library.
///
/// An explicit path that does not exist is an error rather than a silent
/// fallback: the caller asked for that library specifically.
pub fn locate_pdfium_library(explicit: Option<&Path>) -> Result<PathBuf, PdfiumLocateError> {
    let lib_name = platform_library_name()?;

    if let Some(p) = explicit {
        let file = library_file(p, lib_name);
        if file.is_file() {
            debug!("Using configured PDFium library: {}", file.display());
            return Ok(file);
        }
        return Err(PdfiumLocateError::NotFound {
            searched: vec![file],
        });
    }

    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve_implicit(lib_name)?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// The process-wide PDFium binding, created on first use.
///
/// Prefers a located file and falls back to the system library. Failures are
/// not cached, so a later call may still succeed once the library appears.
pub fn shared_pdfium(explicit: Option<&Path>) -> Result<&'static Pdfium, PdfiumLocateError> {
    if let Some(shared) = SHARED.get() {
        return Ok(shared.reuse(explicit));
    }

    let _guard = BIND_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(shared) = SHARED.get() {
        return Ok(shared.reuse(explicit));
    }

    let (pdfium, source) = bind(explicit)?;
    match &source {
        Some(path) => info!("Bound PDFium from {}", path.display()),
        None => info!("Bound PDFium from the system library"),
    }
    Ok(&SHARED.get_or_init(|| SharedPdfium { pdfium, source }).pdfium)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn bind(explicit: Option<&Path>) -> Result<(Pdfium, Option<PathBuf>), PdfiumLocateError> {
    match locate_pdfium_library(explicit) {
        Ok(path) => bind_file(&path).map(|pdfium| (pdfium, Some(path))),
        Err(PdfiumLocateError::NotFound { searched }) if explicit.is_none() => {
            debug!("No PDFium file found, trying the system library");
            Pdfium::bind_to_system_library()
                .map(|bindings| (Pdfium::new(bindings), None))
                .map_err(|e| PdfiumLocateError::SystemBind {
                    searched: searched.len(),
                    reason: e.to_string(),
                })
        }
        Err(e) => Err(e),
    }
}

fn bind_file(path: &Path) -> Result<Pdfium, PdfiumLocateError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn resolve_implicit(lib_name: &str) -> Result<PathBuf, PdfiumLocateError> {
    resolve_in(lib_name, non_empty_env(LIB_PATH_ENV), &pdfium_cache_dir())
}

/// `env_lib` is the `PDFIUM_LIB_PATH` value, `cache_dir` the directory
/// searched after it.
fn resolve_in(
    lib_name: &str,
    env_lib: Option<PathBuf>,
    cache_dir: &Path,
) -> Result<PathBuf, PdfiumLocateError> {
    let mut searched = Vec::new();

    if let Some(env_path) = env_lib {
        let file = library_file(&env_path, lib_name);
        if file.is_file() {
            return Ok(file);
        }
        warn!(
            "{} points at '{}' which does not exist; continuing lookup",
            LIB_PATH_ENV,
            file.display()
        );
        searched.push(file);
    }

    let cached = cache_dir.join(lib_name);
    if cached.is_file() {
        return Ok(cached);
    }
    searched.push(cached);

    Err(PdfiumLocateError::NotFound { searched })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_library_name_is_known() {
        let name = platform_library_name().expect("current platform should be supported");
        assert!(name.contains("pdfium"));
    }

    #[test]
    fn cache_dir_is_deterministic() {
        let d1 = cache_dir_from(None);
        let d2 = cache_dir_from(None);
        assert_eq!(d1, d2);
        assert!(d1.ends_with(Path::new("pidprep").join(format!("pdfium-{PDFIUM_VERSION}"))));
    }

    #[test]
    fn cache_dir_root_override() {
        let d = cache_dir_from(Some(PathBuf::from("/tmp/test_pidprep_override")));
        assert_eq!(
            d,
            Path::new("/tmp/test_pidprep_override").join(format!("pdfium-{PDFIUM_VERSION}"))
        );
    }

    #[test]
    fn explicit_file_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join(platform_library_name().unwrap());
        std::fs::write(&lib, b"not really a library").unwrap();

        let found = locate_pdfium_library(Some(&lib)).unwrap();
        assert_eq!(found, lib);
    }

    #[test]
    fn explicit_directory_resolves_platform_name() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join(platform_library_name().unwrap());
        std::fs::write(&lib, b"stub").unwrap();

        let found = locate_pdfium_library(Some(dir.path())).unwrap();
        assert_eq!(found, lib);
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_pdfium_library(Some(&dir.path().join("nope.so"))).unwrap_err();
        match err {
            PdfiumLocateError::NotFound { searched } => assert_eq!(searched.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_directory_wins_over_cache() {
        let lib_name = platform_library_name().unwrap();
        let env_dir = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(env_dir.path().join(lib_name), b"stub").unwrap();
        std::fs::write(cache.path().join(lib_name), b"stub").unwrap();

        let found = resolve_in(lib_name, Some(env_dir.path().to_path_buf()), cache.path()).unwrap();
        assert_eq!(found, env_dir.path().join(lib_name));
    }

    #[test]
    fn missing_env_path_falls_back_to_cache() {
        let lib_name = platform_library_name().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(cache.path().join(lib_name), b"stub").unwrap();

        let stale = cache.path().join("gone").join(lib_name);
        let found = resolve_in(lib_name, Some(stale), cache.path()).unwrap();
        assert_eq!(found, cache.path().join(lib_name));
    }

    #[test]
    fn nothing_found_lists_every_candidate() {
        let lib_name = platform_library_name().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let stale = empty.path().join("gone");

        match resolve_in(lib_name, Some(stale.clone()), empty.path()).unwrap_err() {
            PdfiumLocateError::NotFound { searched } => {
                assert_eq!(searched, vec![stale, empty.path().join(lib_name)]);
            }
            other => panic!("unexpected error: {other}"),
        }
        match resolve_in(lib_name, None, empty.path()).unwrap_err() {
            PdfiumLocateError::NotFound { searched } => assert_eq!(searched.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shared_binding_is_one_instance_across_threads() {
        let first = match shared_pdfium(None) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("SKIP: PDFium not available: {e}");
                return;
            }
        };
        let others: Vec<&'static Pdfium> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| shared_pdfium(None)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });
        for other in others {
            assert!(std::ptr::eq(first, other));
        }
    }

    #[test]
    fn not_found_display_lists_paths() {
        let e = PdfiumLocateError::NotFound {
            searched: vec![PathBuf::from("/a/libpdfium.so"), PathBuf::from("/b/libpdfium.so")],
        };
        let msg = e.to_string();
        assert!(msg.contains("/a/libpdfium.so"), "got: {msg}");
        assert!(msg.contains("/b/libpdfium.so"), "got: {msg}");
    }
}
