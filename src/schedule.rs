//! Debounced rebuild scheduling.
//!
//! Requests only record a timestamp; a job becomes due once no further
//! request for it has arrived for the configured delay. Callers pass the
//! current time in, so the scheduler never reads a clock itself.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Work that has settled and should run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildJob {
    /// Recompute one document's backlinks.
    File(String),
    /// Rebuild the whole index.
    Full,
}

/// Coalesces rebuild requests.
#[derive(Debug, Clone)]
pub struct RebuildScheduler {
    /// Delay after the last per-document request.
    file_delay: Duration,
    /// Last request time per document.
    files: BTreeMap<String, Instant>,
    /// Last full-rebuild request time, if one is pending.
    full: Option<Instant>,
    /// Delay after the last full-rebuild request.
    full_delay: Duration,
}

impl RebuildScheduler {
    /// Scheduler with the given coalescing delays.
    pub const fn new(full_delay: Duration, file_delay: Duration) -> Self {
        return Self {
            file_delay,
            files: BTreeMap::new(),
            full: None,
            full_delay,
        };
    }

    /// Drop every pending request.
    pub fn clear(&mut self) {
        self.files.clear();
        self.full = None;
    }

    /// Whether nothing is pending.
    pub fn is_idle(&self) -> bool {
        return self.full.is_none() && self.files.is_empty();
    }

    /// Time until the earliest pending job becomes due, zero if one already is.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        if let Some(requested) = self.full {
            return Some(remaining(requested, self.full_delay, now));
        }
        return self
            .files
            .values()
            .map(|requested| return remaining(*requested, self.file_delay, now))
            .min();
    }

    /// Ask for one document's backlinks to be recomputed.
    pub fn request_file(&mut self, path: &str, now: Instant) {
        self.files.insert(path.to_string(), now);
    }

    /// Ask for the whole index to be rebuilt.
    pub fn request_full(&mut self, now: Instant) {
        self.full = Some(now);
    }

    /// Remove and return every job that has settled.
    /// A pending full rebuild holds back per-document jobs and absorbs them when it runs.
    pub fn take_due(&mut self, now: Instant) -> Vec<RebuildJob> {
        if let Some(requested) = self.full {
            if remaining(requested, self.full_delay, now).is_zero() {
                self.clear();
                return vec![RebuildJob::Full];
            }
            return Vec::new();
        }

        let due: Vec<String> = self
            .files
            .iter()
            .filter(|(_, requested)| return remaining(**requested, self.file_delay, now).is_zero())
            .map(|(path, _)| return path.clone())
            .collect();
        for path in &due {
            self.files.remove(path);
        }
        return due.into_iter().map(RebuildJob::File).collect();
    }
}

/// Time left before a request made at `requested` settles.
fn remaining(requested: Instant, delay: Duration, now: Instant) -> Duration {
    return delay.saturating_sub(now.saturating_duration_since(requested));
}
