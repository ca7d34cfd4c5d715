//! Provenance-carrying values
//!
//! Every fact that enters a score is either resolved from its authoritative
//! source or replaced by a documented fallback. The distinction lives in the
//! type so it cannot be lost between layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Gridded climate archive
    Grid,
    /// External collaborator (building registry, land-cover service, ...)
    Provider,
    /// Statistical fallback constant
    Fallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Grid => "grid",
            DataSource::Provider => "provider",
            DataSource::Fallback => "fallback",
        }
    }

    /// Combine the sources of several inputs: any fallback taints the result.
    pub fn merge(self, other: DataSource) -> DataSource {
        if self == DataSource::Fallback || other == DataSource::Fallback {
            DataSource::Fallback
        } else if self == DataSource::Grid || other == DataSource::Grid {
            DataSource::Grid
        } else {
            DataSource::Provider
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a fallback value was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// Missing or corrupt archive, missing attribute, sea/fill cell
    DataUnavailable { detail: String },
    /// Collaborator error or timeout
    CollaboratorFailure { detail: String },
}

impl FallbackReason {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        FallbackReason::DataUnavailable {
            detail: detail.into(),
        }
    }

    pub fn collaborator(detail: impl Into<String>) -> Self {
        FallbackReason::CollaboratorFailure {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::DataUnavailable { detail } => {
                write!(f, "data unavailable: {}", detail)
            }
            FallbackReason::CollaboratorFailure { detail } => {
                write!(f, "collaborator failure: {}", detail)
            }
        }
    }
}

/// A value tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Sourced<T> {
    Resolved { value: T, source: DataSource },
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Sourced<T> {
    pub fn resolved(value: T, source: DataSource) -> Self {
        Sourced::Resolved { value, source }
    }

    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Sourced::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Sourced::Resolved { value, .. } | Sourced::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Sourced::Resolved { value, .. } | Sourced::Fallback { value, .. } => value,
        }
    }

    pub fn data_source(&self) -> DataSource {
        match self {
            Sourced::Resolved { source, .. } => *source,
            Sourced::Fallback { .. } => DataSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Sourced::Resolved { .. } => None,
            Sourced::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Resolved { value, source } => Sourced::Resolved {
                value: f(value),
                source,
            },
            Sourced::Fallback { value, reason } => Sourced::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}

impl<T: Copy> Sourced<T> {
    pub fn get(&self) -> T {
        *self.value()
    }
}
