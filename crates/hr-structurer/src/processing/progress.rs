//! Batch progress, ETA and cancellation

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::{BatchSummary, FileOutcome};

/// Snapshot of batch progress
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    /// 1-based index of the current file
    pub current: usize,
    pub total: usize,
    /// Files finished so far
    pub attempted: usize,
    /// attempted / total
    pub fraction: f64,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    #[serde(with = "option_duration_secs")]
    pub eta: Option<Duration>,
    pub filename: String,
    /// Human-readable status line
    pub status: String,
}

impl ProgressUpdate {
    /// Percentage complete, 0-100
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }

    /// Formatted ETA, if known
    pub fn eta_display(&self) -> Option<String> {
        self.eta.map(format_eta)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

mod option_duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }
}

/// Estimated time remaining from the average time per attempted file
///
/// Needs more than one attempted file for a meaningful average.
pub fn compute_eta(elapsed: Duration, attempted: usize, total: usize) -> Option<Duration> {
    if attempted <= 1 || attempted > total {
        return None;
    }
    let average = elapsed.as_secs_f64() / attempted as f64;
    Some(Duration::from_secs_f64(average * (total - attempted) as f64))
}

/// Render a duration as `1h 2m 3s`, omitting leading zero units
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Tracks elapsed time and attempted files for one batch
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    attempted: usize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            attempted: 0,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn snapshot(&self, current: usize, filename: &str, status: String) -> ProgressUpdate {
        let elapsed = self.elapsed();
        ProgressUpdate {
            current,
            total: self.total,
            attempted: self.attempted,
            fraction: if self.total == 0 {
                0.0
            } else {
                self.attempted as f64 / self.total as f64
            },
            elapsed,
            eta: compute_eta(elapsed, self.attempted, self.total),
            filename: filename.to_string(),
            status,
        }
    }

    /// Snapshot before processing file `current` (1-based)
    pub fn file_started(&self, current: usize, filename: &str) -> ProgressUpdate {
        self.snapshot(
            current,
            filename,
            format!("Processing file {} of {}: {}", current, self.total, filename),
        )
    }

    /// Count a finished file and take a snapshot
    pub fn file_finished(&mut self, current: usize, filename: &str) -> ProgressUpdate {
        self.attempted += 1;
        let mut update = self.snapshot(current, filename, String::new());
        update.status = match update.eta_display() {
            Some(eta) => format!(
                "Processed {} of {} (about {} remaining)",
                self.attempted, self.total, eta
            ),
            None => format!("Processed {} of {}", self.attempted, self.total),
        };
        update
    }
}

/// Receives progress events from a running batch
pub trait ProgressReporter: Send + Sync {
    fn file_started(&self, _update: &ProgressUpdate) {}

    fn file_finished(&self, _update: &ProgressUpdate, _outcome: &FileOutcome) {}

    fn batch_finished(&self, _summary: &BatchSummary) {}
}

/// Reporter that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}

/// Cooperative cancellation flag shared between a batch and its controller
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(Duration::from_secs(3723)), "1h 2m 3s");
        assert_eq!(format_eta(Duration::from_secs(123)), "2m 3s");
        assert_eq!(format_eta(Duration::from_secs(3)), "3s");
        assert_eq!(format_eta(Duration::from_secs(3600)), "1h 0m 0s");
        assert_eq!(format_eta(Duration::from_millis(400)), "0s");
    }

    #[test]
    fn test_compute_eta() {
        assert_eq!(compute_eta(Duration::from_secs(10), 1, 5), None);
        assert_eq!(
            compute_eta(Duration::from_secs(10), 2, 5),
            Some(Duration::from_secs(15))
        );
        assert_eq!(
            compute_eta(Duration::from_secs(10), 5, 5),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_tracker_fraction_and_status() {
        let mut tracker = ProgressTracker::new(4);
        let started = tracker.file_started(1, "a.txt");
        assert_eq!(started.status, "Processing file 1 of 4: a.txt");
        assert_eq!(started.fraction, 0.0);

        let finished = tracker.file_finished(1, "a.txt");
        assert_eq!(finished.attempted, 1);
        assert_eq!(finished.fraction, 0.25);
        assert!(finished.eta.is_none());

        let finished = tracker.file_finished(2, "b.txt");
        assert_eq!(finished.fraction, 0.5);
        assert!(finished.eta.is_some());
    }

    #[test]
    fn test_cancellation_flag_is_shared() {
        let flag = CancellationFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_update_serializes_seconds() {
        let update = ProgressTracker::new(2).file_started(1, "a.txt");
        let value = serde_json::to_value(&update).unwrap();
        assert!(value["elapsed"].is_number());
        assert!(value["eta"].is_null());
    }
}
