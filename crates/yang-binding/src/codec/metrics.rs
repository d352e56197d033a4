//! Codec cache metrics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for codec-unit cache operations.
#[derive(Debug)]
pub struct CodecMetrics {
    /// Lookups served from the cache
    hits: AtomicU64,
    /// Lookups that had to synthesize a codec unit
    misses: AtomicU64,
    /// Codec units synthesized
    syntheses: AtomicU64,
    /// Syntheses that failed
    failures: AtomicU64,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            syntheses: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_synthesis(&self) {
        self.syntheses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn get_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn get_syntheses(&self) -> u64 {
        self.syntheses.load(Ordering::Relaxed)
    }

    pub fn get_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn calculate_hit_ratio(&self) -> f64 {
        let hits = self.get_hits();
        let total = hits + self.get_misses();

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> CodecStats {
        CodecStats {
            hits: self.get_hits(),
            misses: self.get_misses(),
            syntheses: self.get_syntheses(),
            failures: self.get_failures(),
            hit_ratio: self.calculate_hit_ratio(),
        }
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of [`CodecMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodecStats {
    pub hits: u64,
    pub misses: u64,
    pub syntheses: u64,
    pub failures: u64,
    pub hit_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_of_idle_cache_is_zero() {
        assert_eq!(CodecMetrics::new().calculate_hit_ratio(), 0.0);
    }

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = CodecMetrics::new();
        metrics.record_miss();
        metrics.record_synthesis();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();

        let stats = metrics.snapshot();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.syntheses, 1);
        assert_eq!(stats.failures, 0);
        assert!((stats.hit_ratio - 0.75).abs() < f64::EPSILON);
    }
}
