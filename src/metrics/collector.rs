//! Metrics collection and registry.

use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    /// Registration or encoding failed.
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of controller state for metrics update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Whether at least one session is streaming.
    pub is_session_running: bool,
    /// Dual captures attempted.
    pub captures_total: u64,
    /// Dual captures that ended in an error.
    pub capture_failures_total: u64,
    /// Composites produced (captures and recompositions).
    pub composites_total: u64,
    /// Composites that could not be produced from captured stills.
    pub composite_failures_total: u64,
    /// Duration of the latest successful composite.
    pub last_composite_ms: Option<f64>,
}

/// Prometheus metrics registry for the capture pipeline.
pub struct MetricsRegistry {
    registry: Registry,

    sessions_running: IntGauge,
    captures_total: IntCounter,
    capture_failures_total: IntCounter,
    composites_total: IntCounter,
    composite_failures_total: IntCounter,
    last_composite_ms: Gauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let sessions_running = IntGauge::new(
            "dual_capture_sessions_running",
            "Whether capture sessions are streaming (1=running, 0=stopped)",
        )?;
        let captures_total = IntCounter::new(
            "dual_capture_captures_total",
            "Total number of dual captures attempted",
        )?;
        let capture_failures_total = IntCounter::new(
            "dual_capture_capture_failures_total",
            "Total number of dual captures that failed",
        )?;
        let composites_total = IntCounter::new(
            "dual_capture_composites_total",
            "Total number of composites produced",
        )?;
        let composite_failures_total = IntCounter::new(
            "dual_capture_composite_failures_total",
            "Total number of composites that could not be produced",
        )?;
        let last_composite_ms = Gauge::new(
            "dual_capture_last_composite_ms",
            "Duration of the latest composite in milliseconds",
        )?;

        registry.register(Box::new(sessions_running.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(capture_failures_total.clone()))?;
        registry.register(Box::new(composites_total.clone()))?;
        registry.register(Box::new(composite_failures_total.clone()))?;
        registry.register(Box::new(last_composite_ms.clone()))?;

        Ok(Self {
            registry,
            sessions_running,
            captures_total,
            capture_failures_total,
            composites_total,
            composite_failures_total,
            last_composite_ms,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.sessions_running
            .set(if snapshot.is_session_running { 1 } else { 0 });

        // Counters only move forward by the difference
        advance(&self.captures_total, snapshot.captures_total);
        advance(&self.capture_failures_total, snapshot.capture_failures_total);
        advance(&self.composites_total, snapshot.composites_total);
        advance(&self.composite_failures_total, snapshot.composite_failures_total);

        if let Some(ms) = snapshot.last_composite_ms {
            self.last_composite_ms.set(ms);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
