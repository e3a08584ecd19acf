// src/stats/aggregator.rs
use crate::types::AggregateStats;
use std::collections::VecDeque;

/// Default number of computation times kept in the rolling window
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Rolling-window throughput statistics
///
/// Not synchronized on its own; the coordinator keeps it behind the same
/// lock as the mining state so counters and state never tear.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    window: VecDeque<f64>,
    capacity: usize,
    total_blocks: u64,
    mining_rate: f64,
}

impl StatsAggregator {
    /// Creates an empty aggregator keeping at most `capacity` samples
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        StatsAggregator {
            window: VecDeque::with_capacity(capacity),
            capacity,
            total_blocks: 0,
            mining_rate: 0.0,
        }
    }

    /// Records one block's computation time and returns the new totals
    ///
    /// `is_mining` is copied into the returned snapshot unchanged.
    pub fn record(&mut self, computation_time: f64, is_mining: bool) -> AggregateStats {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(computation_time);
        self.total_blocks += 1;
        self.mining_rate = rate_of(&self.window);
        self.snapshot(is_mining)
    }

    /// Current totals without mutation
    pub fn snapshot(&self, is_mining: bool) -> AggregateStats {
        AggregateStats {
            total_blocks: self.total_blocks,
            mining_rate: self.mining_rate,
            is_mining,
            degraded: false,
        }
    }

    /// Clears the window and the block counter
    pub fn reset(&mut self) {
        self.window.clear();
        self.total_blocks = 0;
        self.mining_rate = 0.0;
    }

    /// Samples currently in the window
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Maximum window length
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Blocks per second over the window, zero when nothing was measured
fn rate_of(window: &VecDeque<f64>) -> f64 {
    let sum: f64 = window.iter().sum();
    if sum > 0.0 {
        window.len() as f64 / sum
    } else {
        0.0
    }
}
