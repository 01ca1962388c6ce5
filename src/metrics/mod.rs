//! Prometheus metrics for the capture pipeline.
//!
//! # Metrics Exposed
//!
//! - `dual_capture_sessions_running` - Whether sessions are streaming (1/0)
//! - `dual_capture_captures_total` - Dual captures attempted
//! - `dual_capture_capture_failures_total` - Dual captures that failed
//! - `dual_capture_composites_total` - Composites produced
//! - `dual_capture_composite_failures_total` - Composites that failed
//! - `dual_capture_last_composite_ms` - Latest composite duration
//!
//! # Example
//!
//! ```
//! use dual_capture::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot {
//!     is_session_running: true,
//!     captures_total: 2,
//!     ..Default::default()
//! });
//! assert!(registry.encode().unwrap().contains("dual_capture_captures_total 2"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
