//! Cache hit/miss/error accounting and a coarse performance grade,
//! exposed so the orchestrator can fold cache health into its own
//! telemetry without reaching into the substrate directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters, safe to share across the concurrent callers that
/// hit a single [`crate::LayeredCache`] instance.
#[derive(Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
    total_response_nanos: AtomicU64,
    total_response_samples: AtomicU64,
}

/// Coarse letter grade derived from hit rate, collapsing the raw ratio into
/// a single operator-facing signal instead of a number an operator has to
/// mentally bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    C,
    D,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        write!(f, "{s}")
    }
}

impl CacheStats {
    pub fn record_hit(&self, latency: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    pub fn record_miss(&self, latency: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    pub fn record_set(&self, latency: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, latency: Duration) {
        self.total_response_nanos
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        self.total_response_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Hits / (hits + misses). `None` when nothing has been looked up yet.
    pub fn hit_rate(&self) -> Option<f64> {
        let hits = self.hits() as f64;
        let misses = self.misses() as f64;
        let total = hits + misses;
        if total == 0.0 {
            None
        } else {
            Some(hits / total)
        }
    }

    pub fn average_response_time(&self) -> Option<Duration> {
        let samples = self.total_response_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return None;
        }
        let nanos = self.total_response_nanos.load(Ordering::Relaxed);
        Some(Duration::from_nanos(nanos / samples))
    }

    /// Thresholds chosen so a freshly warmed cache (low sample count, low
    /// hit rate) doesn't read as unhealthy: grading only kicks in once the
    /// hit rate itself is informative.
    pub fn grade(&self) -> Grade {
        match self.hit_rate() {
            None => Grade::B,
            Some(rate) if rate >= 0.95 => Grade::APlus,
            Some(rate) if rate >= 0.85 => Grade::A,
            Some(rate) if rate >= 0.70 => Grade::BPlus,
            Some(rate) if rate >= 0.50 => Grade::B,
            Some(rate) if rate >= 0.25 => Grade::C,
            Some(_) => Grade::D,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_none_until_something_is_looked_up() {
        let s = CacheStats::default();
        assert_eq!(s.hit_rate(), None);
        assert_eq!(s.grade(), Grade::B);
    }

    #[test]
    fn hit_rate_tracks_hits_over_total_lookups() {
        let s = CacheStats::default();
        s.record_hit(Duration::from_millis(1));
        s.record_hit(Duration::from_millis(1));
        s.record_miss(Duration::from_millis(1));
        assert!((s.hit_rate().unwrap() - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn grade_improves_monotonically_with_hit_rate() {
        let perfect = CacheStats::default();
        for _ in 0..100 {
            perfect.record_hit(Duration::from_micros(10));
        }
        assert_eq!(perfect.grade(), Grade::APlus);

        let cold = CacheStats::default();
        for _ in 0..100 {
            cold.record_miss(Duration::from_micros(10));
        }
        assert_eq!(cold.grade(), Grade::D);
    }

    #[test]
    fn average_response_time_reflects_recorded_samples() {
        let s = CacheStats::default();
        s.record_hit(Duration::from_millis(10));
        s.record_hit(Duration::from_millis(20));
        assert_eq!(s.average_response_time(), Some(Duration::from_millis(15)));
    }

    #[test]
    fn errors_and_deletes_do_not_affect_hit_rate() {
        let s = CacheStats::default();
        s.record_hit(Duration::from_millis(1));
        s.record_error();
        s.record_delete();
        assert_eq!(s.hit_rate(), Some(1.0));
        assert_eq!(s.errors(), 1);
        assert_eq!(s.deletes(), 1);
    }
}
