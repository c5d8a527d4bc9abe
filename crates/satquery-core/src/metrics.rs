use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;

/// Point-in-time view of the client counters and pool gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub request_count: u64,
    pub error_count: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_latency_ms: f64,
    pub average_latency_ms: f64,
    pub active_connections: u32,
    pub max_connections: u32,
}

#[derive(Debug, Default)]
struct MetricsInner {
    request_count: u64,
    error_count: u64,
    total_latency_ms: f64,
}

/// Monotonic counters updated once per settled call, never per retry
/// attempt. Mutation is confined to the request engine.
#[derive(Debug)]
pub struct MetricsRecorder {
    inner: Mutex<MetricsInner>,
    enabled: AtomicBool,
}

impl MetricsRecorder {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Mutex::new(MetricsInner::default()),
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn record_success(&self, latency: Duration) {
        self.record(latency, false);
    }

    pub fn record_error(&self, latency: Duration) {
        self.record(latency, true);
    }

    fn record(&self, latency: Duration, failed: bool) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }

        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        inner.request_count += 1;
        inner.total_latency_ms += latency.as_secs_f64() * 1_000.0;
        if failed {
            inner.error_count += 1;
        }
    }

    pub fn snapshot(
        &self,
        cache: CacheStats,
        active_connections: u32,
        max_connections: u32,
    ) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics lock is not poisoned");
        let average_latency_ms = if inner.request_count > 0 {
            inner.total_latency_ms / inner.request_count as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            request_count: inner.request_count,
            error_count: inner.error_count,
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            total_latency_ms: inner.total_latency_ms,
            average_latency_ms,
            active_connections,
            max_connections,
        }
    }
}
