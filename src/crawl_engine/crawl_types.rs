//! Core types for crawl operations.
//!
//! This module contains the error taxonomy shared by every stage, the stage
//! identifiers used for failure accounting, and the outcome type a stage
//! returns to the retry executor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for crawl operations
///
/// Entity-local kinds (address, reconciliation, embedded data, navigation,
/// persistence) are caught at the retry boundary and turned into skips.
/// The remaining kinds are run-level and abort the run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CrawlError {
    /// Address text did not follow `<number> <street> • <city>, <state> <zip>`
    #[error("Malformed address: {0:?}")]
    MalformedAddress(String),

    /// A rendered unit card has no usable counterpart in the embedded data
    #[error("Unit {unit_id:?} not reconciled: {reason}")]
    UnitNotReconciled { unit_id: String, reason: String },

    /// The embedded data blob could not be located or decoded
    #[error("Embedded data unparsable for {url}: {reason}")]
    EmbeddedDataUnparsable { url: String, reason: String },

    /// Page navigation, element interaction or HTTP fetch failed
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Writing to the tabular store or document path failed
    #[error("Persistence I/O error: {0}")]
    PersistenceIo(String),

    /// A spawned entity task panicked before returning
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// The browsing engine could not be started
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    /// The concurrency gate was closed while permits were still needed
    #[error("Concurrency gate closed")]
    GateClosed,

    /// An input list could not be read at all
    #[error("Input file {path} unreadable: {reason}")]
    InputUnreadable { path: String, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrawlError {
    /// Shorthand for navigation failures raised by collaborators
    pub fn navigation(msg: impl fmt::Display) -> Self {
        Self::Navigation(msg.to_string())
    }

    /// Shorthand for persistence failures
    pub fn persistence(msg: impl fmt::Display) -> Self {
        Self::PersistenceIo(msg.to_string())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedAddress(_) => ErrorKind::MalformedAddress,
            Self::UnitNotReconciled { .. } => ErrorKind::UnitNotReconciled,
            Self::EmbeddedDataUnparsable { .. } => ErrorKind::EmbeddedDataUnparsable,
            Self::Navigation(_) => ErrorKind::Navigation,
            Self::PersistenceIo(_) => ErrorKind::PersistenceIo,
            Self::TaskPanicked(_) => ErrorKind::TaskPanicked,
            Self::BrowserLaunch(_)
            | Self::GateClosed
            | Self::InputUnreadable { .. }
            | Self::Config(_) => ErrorKind::Fatal,
        }
    }

    /// Whether this error must abort the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

impl From<std::io::Error> for CrawlError {
    fn from(err: std::io::Error) -> Self {
        Self::PersistenceIo(err.to_string())
    }
}

impl From<csv::Error> for CrawlError {
    fn from(err: csv::Error) -> Self {
        Self::PersistenceIo(err.to_string())
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Failure categories tracked by the run health counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MalformedAddress,
    UnitNotReconciled,
    EmbeddedDataUnparsable,
    Navigation,
    PersistenceIo,
    TaskPanicked,
    Fatal,
}

impl ErrorKind {
    pub const ALL: [Self; 7] = [
        Self::MalformedAddress,
        Self::UnitNotReconciled,
        Self::EmbeddedDataUnparsable,
        Self::Navigation,
        Self::PersistenceIo,
        Self::TaskPanicked,
        Self::Fatal,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedAddress => "malformed_address",
            Self::UnitNotReconciled => "unit_not_reconciled",
            Self::EmbeddedDataUnparsable => "embedded_data_unparsable",
            Self::Navigation => "navigation",
            Self::PersistenceIo => "persistence_io",
            Self::TaskPanicked => "task_panicked",
            Self::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Traversal stages with their own retry budget and failure counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Catalog fetch resolving the cities of one or more states
    StateDiscovery,
    /// Catalog fetch resolving one city by name
    CityDiscovery,
    /// One city page: community discovery plus its communities
    City,
    /// One community page and its units
    Community,
    /// Per-entity extraction (address parsing, unit reconciliation)
    Extraction,
}

impl Stage {
    pub const ALL: [Self; 5] = [
        Self::StateDiscovery,
        Self::CityDiscovery,
        Self::City,
        Self::Community,
        Self::Extraction,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stage invocations that decide whether a run is degraded.
    /// Extraction misses are reported but never degrade a run.
    #[must_use]
    pub const fn is_traversal(self) -> bool {
        !matches!(self, Self::Extraction)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StateDiscovery => "state_discovery",
            Self::CityDiscovery => "city_discovery",
            Self::City => "city",
            Self::Community => "community",
            Self::Extraction => "extraction",
        };
        f.write_str(name)
    }
}

/// What a single stage attempt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    /// The stage finished and produced a value
    Done(T),
    /// The entity is terminally absent (e.g. a 404 city); never retried
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_kinds_are_flagged() {
        assert!(CrawlError::GateClosed.is_fatal());
        assert!(CrawlError::BrowserLaunch("no chrome".into()).is_fatal());
        assert!(!CrawlError::navigation("timeout").is_fatal());
        assert!(
            !CrawlError::UnitNotReconciled {
                unit_id: "204".into(),
                reason: "missing".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn stage_indices_are_dense() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        for (i, kind) in ErrorKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
