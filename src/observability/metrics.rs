//! Thread-safe request counters
//!
//! Atomic counters tracking how queries are routed and how often the
//! generation backend fails. Feeds the statistics endpoint.

use crate::pipeline::record::Category;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics
#[derive(Debug, Default)]
pub struct MetricsCollector {
    requests_total: AtomicU64,
    generation_failures: AtomicU64,
    math_requests: AtomicU64,
    summarizer_requests: AtomicU64,
    translator_requests: AtomicU64,
    fallback_requests: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a classified request
    pub fn record_route(&self, category: Category) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.category_counter(category)
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a generation backend failure absorbed by a handler
    pub fn record_generation_failure(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot current counters for serialization
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut requests_by_category = HashMap::new();
        for category in Category::all() {
            requests_by_category.insert(
                category.as_str().to_string(),
                self.category_counter(category).load(Ordering::Relaxed),
            );
        }

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            requests_by_category,
        }
    }

    fn category_counter(&self, category: Category) -> &AtomicU64 {
        match category {
            Category::Math => &self.math_requests,
            Category::Summarizer => &self.summarizer_requests,
            Category::Translator => &self.translator_requests,
            Category::Fallback => &self.fallback_requests,
        }
    }
}

/// Serializable view of the counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub generation_failures: u64,
    pub requests_by_category: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_route_increments_total_and_category() {
        let collector = MetricsCollector::new();

        collector.record_route(Category::Math);
        collector.record_route(Category::Math);
        collector.record_route(Category::Fallback);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.requests_by_category["math"], 2);
        assert_eq!(snapshot.requests_by_category["fallback"], 1);
        assert_eq!(snapshot.requests_by_category["summarizer"], 0);
        assert_eq!(snapshot.requests_by_category["translator"], 0);
    }

    #[test]
    fn test_record_generation_failure() {
        let collector = MetricsCollector::new();
        collector.record_generation_failure();
        assert_eq!(collector.snapshot().generation_failures, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let collector = MetricsCollector::new();
        collector.record_route(Category::Summarizer);

        let json = serde_json::to_value(collector.snapshot()).unwrap();
        assert_eq!(json["requests_total"], 1);
        assert_eq!(json["requests_by_category"]["summarizer"], 1);
    }
}
