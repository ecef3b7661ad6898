use crate::attempt::AttemptResult;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Counters and round-trip times over a set of attempts, in microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Failures where no HTTP status came back at all.
    pub transport_errors: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub min_rtt_us: u64,
    pub max_rtt_us: u64,
    pub total_rtt_us: u64,
}

impl Default for AttemptStats {
    fn default() -> Self {
        Self {
            attempts: 0,
            successes: 0,
            failures: 0,
            transport_errors: 0,
            status_counts: BTreeMap::new(),
            min_rtt_us: u64::MAX,
            max_rtt_us: u64::MIN,
            total_rtt_us: 0,
        }
    }
}

impl AttemptStats {
    pub fn record(&mut self, attempt: &AttemptResult) {
        self.attempts += 1;
        if attempt.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        match attempt.status {
            Some(status) => *self.status_counts.entry(status.as_u16()).or_default() += 1,
            None => self.transport_errors += 1,
        }
        let rtt = u64::try_from(attempt.elapsed.as_micros()).unwrap_or(u64::MAX);
        update_stats(rtt, &mut self.min_rtt_us, &mut self.max_rtt_us, &mut self.total_rtt_us);
    }

    pub fn merge(&mut self, other: &AttemptStats) {
        self.attempts += other.attempts;
        self.successes += other.successes;
        self.failures += other.failures;
        self.transport_errors += other.transport_errors;
        for (code, count) in &other.status_counts {
            *self.status_counts.entry(*code).or_default() += count;
        }
        self.min_rtt_us = self.min_rtt_us.min(other.min_rtt_us);
        self.max_rtt_us = self.max_rtt_us.max(other.max_rtt_us);
        self.total_rtt_us = self.total_rtt_us.saturating_add(other.total_rtt_us);
    }

    #[inline]
    #[must_use]
    pub fn mean_rtt_us(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.total_rtt_us as f64 / self.attempts as f64
    }

    /// Fraction of attempts classified as success, in `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.successes as f64 / self.attempts as f64
    }
}

fn update_stats(cur: u64, min: &mut u64, max: &mut u64, total: &mut u64) {
    if cur < *min {
        *min = cur;
    }
    if cur > *max {
        *max = cur;
    }
    *total = total.saturating_add(cur);
}

/// What a worker hands back to the controller when it reaches its deadline.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStats {
    pub worker: usize,
    #[serde(flatten)]
    pub stats: AttemptStats,
}

impl WorkerStats {
    #[must_use]
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            stats: AttemptStats::default(),
        }
    }

    #[inline]
    pub fn record(&mut self, attempt: &AttemptResult) {
        self.stats.record(attempt);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(rename = "wall_time_us", serialize_with = "serialize_micros")]
    pub wall_time: Duration,
    pub workers: Vec<WorkerStats>,
}

impl RunReport {
    #[must_use]
    pub fn totals(&self) -> AttemptStats {
        let mut totals = AttemptStats::default();
        for worker in &self.workers {
            totals.merge(&worker.stats);
        }
        totals
    }
}

fn serialize_micros<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = self.totals();
        let (min, max) = if totals.attempts == 0 {
            (0, 0)
        } else {
            (totals.min_rtt_us, totals.max_rtt_us)
        };
        writeln!(f, "Results:")?;
        writeln!(f, "    workers                  = {}", self.workers.len())?;
        writeln!(f, "    wall time                = {:?}", self.wall_time)?;
        writeln!(
            f,
            "    attempts                 = {} (success {}, failure {}, transport errors {})",
            totals.attempts, totals.successes, totals.failures, totals.transport_errors
        )?;
        writeln!(f, "    success rate             = {:.2}%", totals.success_rate() * 100.0)?;
        writeln!(
            f,
            "    rtt us [min, mean, max]  = [{}, {:.2}, {}]",
            min,
            totals.mean_rtt_us(),
            max
        )?;
        for (code, count) in &totals.status_counts {
            writeln!(f, "    status {code}               = {count}")?;
        }
        Ok(())
    }
}
