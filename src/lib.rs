//! Mining coordinator for a proof-of-work mining simulator
//!
//! Drives a fetch-then-hash loop against two collaborator services (a
//! random-number source and a hash engine), tracks rolling throughput
//! statistics and exposes start/stop/stats controls over HTTP:
//! - Idle/Running state machine with a single background loop
//! - Rolling-window mining rate and block counter
//! - Progress published to a shared key-value store (Redis or in-memory)
//! - Prometheus metrics

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// HTTP control surface
pub mod api;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Mining state machine and loop
pub mod miner;

/// Collaborator service clients
pub mod network;

/// Throughput statistics and metrics
pub mod stats;

/// Shared key-value store adapters
pub mod store;

/// Shared type definitions
pub mod types;

/// Utility functions and error handling
pub mod utils;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{Coordinator, LoopSettings, StepOutcome};
pub use network::{ComputeService, HashOutcome, HttpComputeClient};
pub use stats::StatsAggregator;
pub use store::{MemoryStore, RedisStore, SharedStore, StoreBackend};
pub use types::{AggregateStats, ControlStatus, MiningResult, MiningState};
pub use utils::{CoordinatorError, init_logging};
