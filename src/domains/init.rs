//! Provisioning age from the stamp file written by the provisioning routine

use crate::error::{DotpulseError, DotpulseResult};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::debug;

/// Payload of the `init` domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitPayload {
    /// The managed source checkout exists on this host
    pub in_managed_tree: bool,

    /// Epoch seconds of the last successful provisioning run (0 = never)
    pub last_run: i64,

    /// `last_run` is older than the configured maximum age
    pub needs_update: bool,
}

impl InitPayload {
    /// Whether quiet mode should mention provisioning
    pub fn is_overdue(&self) -> bool {
        self.in_managed_tree && self.needs_update
    }
}

/// Reads the stamp file; never invokes the provisioning routine itself
pub struct InitInspector {
    managed_tree: PathBuf,
    stamp_file: PathBuf,
    max_age_secs: i64,
}

impl InitInspector {
    pub fn new(managed_tree: PathBuf, stamp_file: PathBuf, max_age_secs: i64) -> Self {
        Self {
            managed_tree,
            stamp_file,
            max_age_secs,
        }
    }

    pub async fn inspect(&self, now: i64) -> DotpulseResult<InitPayload> {
        let in_managed_tree = fs::metadata(self.managed_tree.join(".git")).await.is_ok();
        let last_run = read_stamp(&self.stamp_file).await?;

        Ok(InitPayload {
            in_managed_tree,
            last_run,
            needs_update: last_run <= 0 || now - last_run > self.max_age_secs,
        })
    }
}

/// Read epoch seconds from `path`, falling back to its mtime; 0 if missing
async fn read_stamp(path: &Path) -> DotpulseResult<i64> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No provisioning stamp at {}", path.display());
            return Ok(0);
        }
        Err(e) => {
            return Err(DotpulseError::io(
                format!("reading provisioning stamp {}", path.display()),
                e,
            ))
        }
    };

    if let Ok(secs) = content.trim().parse::<i64>() {
        return Ok(secs.max(0));
    }

    debug!("Stamp {} is not a timestamp, using mtime", path.display());
    let modified = fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .map_err(|e| DotpulseError::io(format!("reading mtime of {}", path.display()), e))?;

    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0))
}
