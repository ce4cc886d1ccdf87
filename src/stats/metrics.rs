//! Statistics for admission and snapshot capture

use std::time::Duration;

/// Admission controller counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionStats {
    /// Slots granted (re-requests of an active stream not counted)
    pub granted: u64,
    /// Requests denied for lack of capacity or suspension
    pub denied: u64,
    /// Voluntary releases of an existing slot
    pub released: u64,
    /// Slots revoked by the controller
    pub evicted: u64,
}

impl AdmissionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of requests that were denied
    pub fn denial_ratio(&self) -> f64 {
        let total = self.granted + self.denied;
        if total > 0 {
            self.denied as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Snapshot scheduler counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Capture cycles that ran to completion (or were cut short by suspension)
    pub cycles_completed: u64,
    /// Cycles skipped because one was already running
    pub cycles_skipped: u64,
    /// Snapshots delivered
    pub captures_succeeded: u64,
    /// Capture attempts that failed
    pub captures_failed: u64,
    /// Capture attempts abandoned on suspension
    pub captures_cancelled: u64,
    /// Wall time of the most recent cycle
    pub last_cycle_duration: Duration,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total capture attempts
    pub fn captures_attempted(&self) -> u64 {
        self.captures_succeeded + self.captures_failed + self.captures_cancelled
    }

    pub(crate) fn record_cycle(&mut self, report: &CycleReport, duration: Duration) {
        if report.skipped {
            self.cycles_skipped += 1;
            return;
        }
        self.cycles_completed += 1;
        self.captures_succeeded += report.succeeded as u64;
        self.captures_failed += report.failed as u64;
        self.captures_cancelled += report.cancelled as u64;
        self.last_cycle_duration = duration;
    }
}

/// Outcome of one capture cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Streams a capture was attempted for
    pub attempted: usize,
    /// Snapshots delivered
    pub succeeded: usize,
    /// Attempts that failed
    pub failed: usize,
    /// Attempts abandoned because of suspension
    pub cancelled: usize,
    /// Whether the cycle did not run because another was in progress
    pub skipped: bool,
}

impl CycleReport {
    pub(crate) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
