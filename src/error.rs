//! Error types for dotpulse
//!
//! All modules use `DotpulseResult<T>` as their return type. Only a handful of
//! these ever reach the user: backend and refresh failures are absorbed into
//! `CANNOT_DETERMINE` or a stale cache entry long before `main` sees them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dotpulse operations
pub type DotpulseResult<T> = Result<T, DotpulseError>;

/// All errors that can occur in dotpulse
#[derive(Error, Debug)]
pub enum DotpulseError {
    // Cache errors
    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Unknown package backend: {0}")]
    UnknownBackend(String),

    // Refresh errors
    #[error("Refresh of {domain} failed: {reason}")]
    RefreshFailed { domain: String, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {secs}s: {command}")]
    CommandTimeout { command: String, secs: u64 },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl DotpulseError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a refresh failure for a domain
    pub fn refresh_failed(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RefreshFailed {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error leaves no stale fallback to show
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CacheDirCreate { .. } | Self::CacheWrite { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheDirCreate { .. } | Self::CacheWrite { .. } => Some(
                "Check permissions on the cache directory, or point cache.dir / DOTPULSE_CACHE_DIR somewhere writable",
            ),
            Self::ConfigInvalid { .. } => {
                Some("Fix the file, or regenerate it with: dotpulse config init --force")
            }
            Self::UnknownDomain(_) => Some("Valid domains: packages, git, init"),
            Self::UnknownBackend(_) => Some("Run: dotpulse backends"),
            _ => None,
        }
    }
}
