//! The three independently cached facts
//!
//! | Domain | Source | Default TTL |
//! |--------|--------|-------------|
//! | `packages` | package manager backends | 6 hours |
//! | `git` | read-only git queries on one repository | 1 hour |
//! | `init` | provisioning timestamp file | 1 day |

pub mod git;
pub mod init;
pub mod packages;

pub use git::{GitInspector, GitPayload};
pub use init::{InitInspector, InitPayload};
pub use packages::{ManagerStatus, PackagesPayload};

use crate::error::DotpulseError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One cached fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Packages,
    Git,
    Init,
}

impl Domain {
    /// All domains in report order
    pub const ALL: [Domain; 3] = [Domain::Packages, Domain::Git, Domain::Init];

    /// Name used on the command line and in cache file names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Packages => "packages",
            Self::Git => "git",
            Self::Init => "init",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Domain {
    type Err = DotpulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packages" | "pkg" | "pkgs" => Ok(Self::Packages),
            "git" => Ok(Self::Git),
            "init" => Ok(Self::Init),
            other => Err(DotpulseError::UnknownDomain(other.to_string())),
        }
    }
}

/// Payload persisted for a domain
pub trait DomainPayload:
    Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Domain this payload belongs to
    const DOMAIN: Domain;
}

impl DomainPayload for PackagesPayload {
    const DOMAIN: Domain = Domain::Packages;
}

impl DomainPayload for GitPayload {
    const DOMAIN: Domain = Domain::Git;
}

impl DomainPayload for InitPayload {
    const DOMAIN: Domain = Domain::Init;
}
