//! Per-domain status cache
//!
//! One JSON document per domain under the cache directory:
//!
//! | File | Domain |
//! |------|--------|
//! | `packages.json` | package updates |
//! | `git-<hash>.json` | one repository, keyed by path |
//! | `init.json` | provisioning age |
//!
//! Entries are overwritten wholesale on refresh and only deleted by
//! `dotpulse cache clear`.

pub mod entry;
pub mod store;

pub use entry::{epoch_now, CacheEntry, CacheKey};
pub use store::CacheStore;
