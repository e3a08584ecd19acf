// src/stats/mod.rs
//! Throughput statistics
//!
//! - [`StatsAggregator`]: rolling window of computation times, block
//!   counter and derived mining rate
//! - [`metrics`]: Prometheus counters and gauges mirrored from the loop

/// Rolling-window aggregator
pub mod aggregator;

/// Prometheus metrics
pub mod metrics;

pub use aggregator::{DEFAULT_WINDOW_SIZE, StatsAggregator};
