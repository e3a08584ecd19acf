// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the mining loop
///
/// Process-wide and never persisted; a restarted process is always idle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningState {
    /// No loop iterations are being scheduled
    #[default]
    Idle,
    /// The loop is actively iterating
    Running,
}

impl MiningState {
    /// `true` for [`MiningState::Running`]
    pub fn is_running(self) -> bool {
        self == MiningState::Running
    }
}

impl fmt::Display for MiningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiningState::Idle => write!(f, "idle"),
            MiningState::Running => write!(f, "running"),
        }
    }
}

/// One successful fetch-then-hash iteration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiningResult {
    /// When the result was recorded
    pub timestamp: DateTime<Utc>,
    /// Number obtained from the random source
    pub input_number: u64,
    /// Lowercase hex digest reported by the hash engine
    pub hash_hex: String,
    /// Seconds the hash engine spent computing
    pub computation_time: f64,
}

/// Aggregated throughput statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Blocks recorded since the last reset
    pub total_blocks: u64,
    /// Blocks per second derived from the rolling window
    pub mining_rate: f64,
    /// Mirrors [`MiningState::Running`]
    pub is_mining: bool,
    /// Set when the shared store could not be read and the values come
    /// from process memory only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// Outcome of a start or stop command
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    /// Idle → Running transition happened
    Started,
    /// Start requested while already running
    AlreadyRunning,
    /// Running → Idle transition happened
    Stopped,
    /// Stop requested while idle
    NotRunning,
}

/// Body returned by the start and stop routes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlReply {
    /// What the command did
    pub status: ControlStatus,
}

/// Liveness probe answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Whether the loop is currently running
    pub is_mining: bool,
}

/// Failure counters kept by the mining loop
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    /// Failed random-number fetches
    pub rng_errors: u64,
    /// Failed hash computations
    pub hash_errors: u64,
    /// Loops aborted by an unrecoverable error
    pub fatal_errors: u64,
}
