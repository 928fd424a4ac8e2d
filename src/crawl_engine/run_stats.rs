//! Run health counters.
//!
//! Per-stage call/failure counts and per-kind error counts, updated with
//! atomics from any task and read once at the end of the run.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::crawl_types::{CrawlError, ErrorKind, Stage};

/// Most recent errors kept for the end-of-run report
const RECENT_ERRORS_CAPACITY: usize = 50;

#[derive(Debug, Default)]
struct StageCounters {
    total_calls: AtomicU64,
    failed_calls: AtomicU64,
}

/// Process-wide statistics for one run.
///
/// All counters use `Ordering::SeqCst` so a snapshot is coherent across
/// fields.
#[derive(Debug)]
pub struct RunStats {
    stages: [StageCounters; Stage::ALL.len()],
    errors: [AtomicU64; ErrorKind::ALL.len()],
    recent: Mutex<VecDeque<RecordedError>>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Default::default(),
            errors: Default::default(),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_ERRORS_CAPACITY)),
        }
    }

    /// Count one invocation of `stage`
    pub fn record_call(&self, stage: Stage) {
        self.stages[stage.index()]
            .total_calls
            .fetch_add(1, Ordering::SeqCst);
    }

    /// Count a terminal failure of `stage` and remember the error
    pub fn record_failure(&self, stage: Stage, error: &CrawlError) {
        self.stages[stage.index()]
            .failed_calls
            .fetch_add(1, Ordering::SeqCst);
        self.errors[error.kind().index()].fetch_add(1, Ordering::SeqCst);

        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == RECENT_ERRORS_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(RecordedError {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// One extraction step (address parse, unit reconciliation) that succeeded
    pub fn record_extraction_ok(&self) {
        self.record_call(Stage::Extraction);
    }

    /// One extraction step that failed; the entity is skipped by the caller
    pub fn record_extraction_failure(&self, error: &CrawlError) {
        self.record_call(Stage::Extraction);
        self.record_failure(Stage::Extraction, error);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let stages = Stage::ALL
            .iter()
            .map(|&stage| {
                let counters = &self.stages[stage.index()];
                StageSnapshot {
                    stage,
                    total_calls: counters.total_calls.load(Ordering::SeqCst),
                    failed_calls: counters.failed_calls.load(Ordering::SeqCst),
                }
            })
            .collect();

        let errors = ErrorKind::ALL
            .iter()
            .map(|&kind| (kind, self.errors[kind.index()].load(Ordering::SeqCst)))
            .collect();

        let recent_errors = self
            .recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();

        StatsSnapshot {
            stages,
            errors,
            recent_errors,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageSnapshot {
    pub stage: Stage,
    pub total_calls: u64,
    pub failed_calls: u64,
}

impl StageSnapshot {
    #[must_use]
    pub fn failure_ratio(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.failed_calls as f64 / self.total_calls as f64
    }

    /// Strictly above `threshold` counts as degraded
    #[must_use]
    pub fn is_degraded(&self, threshold: f64) -> bool {
        self.failure_ratio() > threshold
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub stages: Vec<StageSnapshot>,
    pub errors: Vec<(ErrorKind, u64)>,
    pub recent_errors: Vec<RecordedError>,
}

impl StatsSnapshot {
    #[must_use]
    pub fn stage(&self, stage: Stage) -> StageSnapshot {
        self.stages
            .iter()
            .copied()
            .find(|s| s.stage == stage)
            .unwrap_or(StageSnapshot {
                stage,
                total_calls: 0,
                failed_calls: 0,
            })
    }

    #[must_use]
    pub fn error_count(&self, kind: ErrorKind) -> u64 {
        self.errors
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, count)| *count)
    }

    /// Traversal stages whose failure ratio exceeds `threshold`
    #[must_use]
    pub fn degraded_stages(&self, threshold: f64) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|s| s.stage.is_traversal() && s.is_degraded(threshold))
            .map(|s| s.stage)
            .collect()
    }

    #[must_use]
    pub fn is_degraded(&self, threshold: f64) -> bool {
        !self.degraded_stages(threshold).is_empty()
    }

    /// Plain-text report used for logs and notifications
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::from("Stage calls (total / failed):\n");
        for s in &self.stages {
            let _ = writeln!(
                out,
                "  {:<16} {:>6} / {:<6} ({:.1}%)",
                s.stage.to_string(),
                s.total_calls,
                s.failed_calls,
                s.failure_ratio() * 100.0
            );
        }

        out.push_str("Errors by kind:\n");
        for (kind, count) in self.errors.iter().filter(|(_, c)| *c > 0) {
            let _ = writeln!(out, "  {:<24} {count}", kind.to_string());
        }

        if !self.recent_errors.is_empty() {
            out.push_str("Recent errors:\n");
            for e in &self.recent_errors {
                let _ = writeln!(out, "  [{}] {}", e.stage, e.message);
            }
        }
        out
    }
}
