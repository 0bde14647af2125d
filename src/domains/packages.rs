//! Reduced package update status

use crate::backends::{Backend, BackendCheckResult, UpdateState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cached state of one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub has_updates: UpdateState,

    /// Present only when `has_updates` is `UPDATES_AVAILABLE` and countable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Why the backend could not determine its state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&BackendCheckResult> for ManagerStatus {
    fn from(result: &BackendCheckResult) -> Self {
        match result {
            BackendCheckResult::NoUpdates => Self {
                has_updates: UpdateState::NoUpdates,
                count: None,
                reason: None,
            },
            BackendCheckResult::UpdatesAvailable { count } => Self {
                has_updates: UpdateState::UpdatesAvailable,
                count: *count,
                reason: None,
            },
            BackendCheckResult::CannotDetermine { reason } => Self {
                has_updates: UpdateState::CannotDetermine,
                count: None,
                reason: Some(reason.clone()),
            },
        }
    }
}

/// Payload of the `packages` domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagesPayload {
    /// Backend name to its state
    pub managers: BTreeMap<String, ManagerStatus>,

    /// Sum of counts over backends with updates available
    pub total_updates: u64,
}

impl PackagesPayload {
    /// Fold per-backend results into one payload.
    ///
    /// Only `UPDATES_AVAILABLE` results contribute to `total_updates`;
    /// indeterminate backends are listed but add nothing.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (Backend, BackendCheckResult)>,
    {
        let mut payload = Self::default();

        for (backend, result) in results {
            if let BackendCheckResult::UpdatesAvailable { count: Some(n) } = result {
                payload.total_updates = payload.total_updates.saturating_add(u64::from(n));
            }
            payload
                .managers
                .insert(backend.name().to_string(), ManagerStatus::from(&result));
        }

        payload
    }

    /// Backends that reported updates
    pub fn with_updates(&self) -> impl Iterator<Item = (&str, &ManagerStatus)> {
        self.managers
            .iter()
            .filter(|(_, s)| s.has_updates == UpdateState::UpdatesAvailable)
            .map(|(name, s)| (name.as_str(), s))
    }

    /// Backends that could not determine their state
    pub fn indeterminate(&self) -> impl Iterator<Item = (&str, &ManagerStatus)> {
        self.managers
            .iter()
            .filter(|(_, s)| s.has_updates == UpdateState::CannotDetermine)
            .map(|(name, s)| (name.as_str(), s))
    }

    /// Whether any backend has updates, counted or not
    pub fn has_updates(&self) -> bool {
        self.total_updates > 0 || self.with_updates().next().is_some()
    }
}
