//! Cache entries, keys and staleness

use crate::domains::Domain;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

/// Current time in epoch seconds
pub fn epoch_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// One persisted domain document: `last_check` plus the payload's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<P> {
    /// Epoch seconds of the last refresh; 0 = never checked
    pub last_check: i64,

    #[serde(flatten)]
    pub payload: P,
}

impl<P> CacheEntry<P> {
    pub fn new(last_check: i64, payload: P) -> Self {
        Self {
            last_check,
            payload,
        }
    }

    /// Seconds since the last refresh
    pub fn age(&self, now: i64) -> i64 {
        now - self.last_check
    }

    /// Whether the entry has outlived `ttl`.
    ///
    /// Never-checked entries and entries stamped in the future (the clock
    /// went backwards) are stale too.
    pub fn is_stale(&self, now: i64, ttl: Duration) -> bool {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let age = self.age(now);
        self.last_check <= 0 || age < 0 || age > ttl
    }
}

/// Where a domain's entry lives.
///
/// `packages` and `init` use fixed file names; `git` is keyed by the
/// repository it describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: Domain,
    scope: Option<String>,
}

impl CacheKey {
    /// Key for a single-instance domain
    pub fn domain(domain: Domain) -> Self {
        Self {
            domain,
            scope: None,
        }
    }

    /// Key derived from the content of `path` (first 12 hex chars of SHA256)
    pub fn scoped(domain: Domain, path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self {
            domain,
            scope: Some(digest[..12].to_string()),
        }
    }

    /// Cache file name
    pub fn file_name(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}-{}.json", self.domain, scope),
            None => format!("{}.json", self.domain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[test]
    fn staleness_boundary() {
        let now = 1_700_000_000;
        let ttl = TTL.as_secs() as i64;

        assert!(CacheEntry::new(now - ttl - 1, ()).is_stale(now, TTL));
        assert!(!CacheEntry::new(now - ttl + 1, ()).is_stale(now, TTL));
        assert!(!CacheEntry::new(now - ttl, ()).is_stale(now, TTL));
    }

    #[test]
    fn never_checked_is_stale() {
        assert!(CacheEntry::new(0, ()).is_stale(1_700_000_000, TTL));
    }

    #[test]
    fn future_timestamp_is_stale() {
        let now = 1_700_000_000;
        assert!(CacheEntry::new(now + 600, ()).is_stale(now, TTL));
    }

    #[test]
    fn flattened_document_shape() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Payload {
            total_updates: u64,
        }

        let entry = CacheEntry::new(42, Payload { total_updates: 5 });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"last_check": 42, "total_updates": 5}));

        let back: CacheEntry<Payload> = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn key_file_names() {
        assert_eq!(CacheKey::domain(Domain::Packages).file_name(), "packages.json");

        let a = CacheKey::scoped(Domain::Git, Path::new("/home/me/.dotfiles"));
        let b = CacheKey::scoped(Domain::Git, Path::new("/home/me/work"));
        assert!(a.file_name().starts_with("git-"));
        assert_eq!(a.file_name().len(), "git-".len() + 12 + ".json".len());
        assert_ne!(a, b);
        assert_eq!(a, CacheKey::scoped(Domain::Git, Path::new("/home/me/.dotfiles")));
    }
}
