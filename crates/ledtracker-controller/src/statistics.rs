//! Update statistics.
//!
//! Counters are plain atomics so the refresh loop and HTTP handlers can
//! record outcomes without taking a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatistics {
    /// Successful matrix updates.
    pub matrix_updates: u64,

    /// Updates that failed to fetch or render.
    pub failed_updates: u64,

    /// Controller uptime in seconds.
    pub uptime: u64,
}

/// Collects update outcomes.
pub struct StatisticsCollector {
    start_time: Instant,
    matrix_updates: AtomicU64,
    failed_updates: AtomicU64,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            matrix_updates: AtomicU64::new(0),
            failed_updates: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self) {
        self.matrix_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UpdateStatistics {
        UpdateStatistics {
            matrix_updates: self.matrix_updates.load(Ordering::Relaxed),
            failed_updates: self.failed_updates.load(Ordering::Relaxed),
            uptime: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_collection() {
        let stats = StatisticsCollector::new();

        stats.record_success();
        stats.record_success();
        stats.record_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.matrix_updates, 2);
        assert_eq!(snapshot.failed_updates, 1);
    }

    #[test]
    fn test_statistics_json() {
        let json = serde_json::to_value(StatisticsCollector::new().snapshot()).unwrap();

        assert_eq!(json["matrixUpdates"], 0);
        assert_eq!(json["failedUpdates"], 0);
        assert!(json["uptime"].is_u64());
    }
}
