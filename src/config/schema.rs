//! Configuration schema for dotpulse
//!
//! Configuration is stored at `~/.config/dotpulse/config.toml`

use crate::domains::Domain;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location
    pub cache: CacheConfig,

    /// Package update checks
    pub packages: PackagesConfig,

    /// Repository inspection
    pub git: GitConfig,

    /// Provisioning age tracking
    pub init: InitConfig,
}

impl Config {
    /// Time-to-live of a domain's cache entry
    pub fn ttl_for(&self, domain: Domain) -> Duration {
        let secs = match domain {
            Domain::Packages => self.packages.ttl_secs,
            Domain::Git => self.git.ttl_secs,
            Domain::Init => self.init.ttl_secs,
        };
        Duration::from_secs(secs)
    }

    /// Directory holding the per-domain cache files
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(crate::config::ConfigManager::default_cache_dir)
    }

    /// The managed source checkout
    pub fn managed_tree(&self) -> PathBuf {
        self.init
            .managed_tree
            .clone()
            .unwrap_or_else(|| home_dir().join(".dotfiles"))
    }

    /// Repository inspected by the git domain
    pub fn git_repo(&self) -> PathBuf {
        self.git.repo.clone().unwrap_or_else(|| self.managed_tree())
    }

    /// Timestamp file written by the provisioning routine
    pub fn stamp_file(&self) -> PathBuf {
        self.init.stamp_file.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dotfiles")
                .join("last-init")
        })
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Master switch; when off, status prints nothing
    pub enabled: bool,

    /// Spawn a detached refresh when a domain is stale
    pub background_refresh: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            background_refresh: true,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (default: platform cache dir + `dotpulse`)
    pub dir: Option<PathBuf>,
}

/// Package manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Seconds before the packages entry goes stale (default: 6 hours)
    pub ttl_secs: u64,

    /// Hard timeout for a single backend check
    pub check_timeout_secs: u64,

    /// Timeout for a single backend upgrade
    pub upgrade_timeout_secs: u64,

    /// Backends to poll (absent = every known backend)
    pub backends: Option<Vec<String>>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 6 * 60 * 60,
            check_timeout_secs: 30,
            upgrade_timeout_secs: 60 * 60,
            backends: None,
        }
    }
}

impl PackagesConfig {
    /// Per-backend check timeout
    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    /// Per-backend upgrade timeout
    pub fn upgrade_timeout(&self) -> Duration {
        Duration::from_secs(self.upgrade_timeout_secs)
    }
}

/// Repository inspection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Seconds before the git entry goes stale (default: 1 hour)
    pub ttl_secs: u64,

    /// Timeout for each git query
    pub timeout_secs: u64,

    /// Repository to inspect (default: the managed tree)
    pub repo: Option<PathBuf>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60,
            timeout_secs: 10,
            repo: None,
        }
    }
}

/// Provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Seconds before the init entry goes stale (default: 1 day)
    pub ttl_secs: u64,

    /// Provisioning older than this many days is overdue
    pub max_age_days: u32,

    /// Managed source checkout (default: `~/.dotfiles`)
    pub managed_tree: Option<PathBuf>,

    /// File holding the epoch seconds of the last provisioning run
    pub stamp_file: Option<PathBuf>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            max_age_days: 7,
            managed_tree: None,
            stamp_file: None,
        }
    }
}

impl InitConfig {
    /// Overdue threshold in seconds
    pub fn max_age_secs(&self) -> i64 {
        i64::from(self.max_age_days) * 24 * 60 * 60
    }
}
