//! dotpulse - cached shell status for packages, git and provisioning
//!
//! Answers "is there anything I should do on this machine?" fast enough to
//! run on every shell start, by serving each answer from a per-domain cache
//! and refreshing stale answers in a detached background process.

pub mod backends;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domains;
pub mod error;
pub mod exec;
pub mod logging;
pub mod orchestrator;
pub mod refresh;
pub mod report;
pub mod ui;

pub use error::{DotpulseError, DotpulseResult};
