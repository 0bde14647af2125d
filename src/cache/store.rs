//! Durable, atomic per-domain JSON files
//!
//! Writes go to a uniquely named temp file in the same directory, are
//! fsynced, then renamed over the target. Readers therefore see either the
//! previous document or the new one, never a partial write. Concurrent
//! writers are not serialized: the last rename wins.

use crate::cache::entry::{CacheEntry, CacheKey};
use crate::domains::{Domain, DomainPayload};
use crate::error::{DotpulseError, DotpulseResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Cache directory handle
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open the cache directory, creating it if needed.
    ///
    /// Failing to create it is the one fatal error: there is no stale
    /// fallback without a cache.
    pub async fn open(dir: PathBuf) -> DotpulseResult<Self> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DotpulseError::CacheDirCreate {
                path: dir.clone(),
                source: e,
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&dir, perms) {
                debug!("Could not restrict {}: {}", dir.display(), e);
            }
        }

        Ok(Self { dir })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read an entry. Missing and unparsable files both read as `None`.
    pub async fn read<P: DomainPayload>(&self, key: &CacheKey) -> Option<CacheEntry<P>> {
        let path = self.entry_path(key);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(
                    "Cache file {} is unparsable, treating as never checked: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Replace an entry atomically
    pub async fn write<P: DomainPayload>(
        &self,
        key: &CacheKey,
        entry: &CacheEntry<P>,
    ) -> DotpulseResult<()> {
        let path = self.entry_path(key);
        let content = serde_json::to_string_pretty(entry)?;
        let temp_path = self
            .dir
            .join(format!(".{}.{}.tmp", key.file_name(), Uuid::new_v4().simple()));

        let written = write_synced(&temp_path, content.as_bytes()).await;
        let renamed = match written {
            Ok(()) => fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = renamed {
            let _ = fs::remove_file(&temp_path).await;
            return Err(DotpulseError::CacheWrite { path, source: e });
        }

        debug!("Wrote {} (last_check {})", path.display(), entry.last_check);
        Ok(())
    }

    /// Delete one entry; returns whether it existed
    pub async fn remove(&self, key: &CacheKey) -> DotpulseResult<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DotpulseError::io(
                format!("removing cache file {}", path.display()),
                e,
            )),
        }
    }

    /// Delete every dotpulse cache document and leftover temp file.
    /// Anything else sharing the directory is left alone.
    pub async fn clear(&self) -> DotpulseResult<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(DotpulseError::io("reading cache directory", e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DotpulseError::io("reading cache entry", e))?
        {
            let path = entry.path();
            if entry.file_name().to_str().is_some_and(is_cache_file) {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| DotpulseError::io("removing cache file", e))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// `packages.json`, `init.json`, `git-<hash>.json` and `.<file>.<id>.tmp`
fn is_cache_file(name: &str) -> bool {
    let document = match name.strip_prefix('.').and_then(|n| n.strip_suffix(".tmp")) {
        Some(temp) => match temp.rsplit_once('.') {
            Some((document, _id)) => document,
            None => return false,
        },
        None => name,
    };

    let Some(stem) = document.strip_suffix(".json") else {
        return false;
    };
    let is_repo_hash = |hash: &str| !hash.is_empty() && hash.chars().all(|c| c.is_ascii_hexdigit());
    stem == Domain::Packages.name()
        || stem == Domain::Init.name()
        || stem
            .strip_prefix(Domain::Git.name())
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(is_repo_hash)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
