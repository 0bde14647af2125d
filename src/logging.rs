//! tracing subscriber setup
//!
//! Foreground invocations log to stderr, filtered by `-v`. Detached refreshes
//! have no terminal, so they append JSON lines to `refresh.log` in the cache
//! directory instead.

use crate::error::{DotpulseError, DotpulseResult};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file written by background refreshes
pub const REFRESH_LOG: &str = "refresh.log";

/// Size at which `refresh.log` is rotated to `refresh.log.old`
const MAX_LOG_BYTES: u64 = 512 * 1024;

/// Filter for a verbosity level; `DOTPULSE_LOG` overrides it when set
pub fn filter_for(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_env("DOTPULSE_LOG").unwrap_or_else(|_| {
        // 0 = warn, 1 = info, 2+ = debug
        match verbose {
            0 => EnvFilter::new("dotpulse=warn"),
            1 => EnvFilter::new("dotpulse=info"),
            _ => EnvFilter::new("dotpulse=debug"),
        }
    })
}

/// Human-readable logs on stderr
pub fn init_foreground(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// JSON lines appended to `<cache_dir>/refresh.log`.
///
/// Background refreshes log at info level at least, so the file records
/// every refresh outcome. If the log cannot be opened the refresh still
/// runs, just without a log.
pub fn init_background(cache_dir: &Path, verbose: u8) {
    let file = match open_log(cache_dir) {
        Ok(file) => file,
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter_for(verbose.max(1)))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_current_span(false)
        .init();
}

/// Open the background log for appending, rotating it first when large
fn open_log(cache_dir: &Path) -> DotpulseResult<File> {
    fs::create_dir_all(cache_dir).map_err(|e| DotpulseError::CacheDirCreate {
        path: cache_dir.to_path_buf(),
        source: e,
    })?;

    let path = log_path(cache_dir);
    rotate_if_large(&path, MAX_LOG_BYTES);

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| DotpulseError::io(format!("opening {}", path.display()), e))
}

/// Location of the background log
pub fn log_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(REFRESH_LOG)
}

/// Move `path` aside once it exceeds `limit` bytes, replacing any older copy
fn rotate_if_large(path: &Path, limit: u64) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if meta.len() <= limit {
        return false;
    }

    let mut old = path.as_os_str().to_owned();
    old.push(".old");
    fs::rename(path, PathBuf::from(old)).is_ok()
}
