// src/miner/mod.rs
//! Mining lifecycle
//!
//! - [`Coordinator`]: Idle/Running state machine and control operations
//! - [`MiningLoop`]: the background fetch → hash → record → pace loop

/// State machine and control surface
pub mod coordinator;

/// Background mining loop
pub mod worker;

pub use self::coordinator::{Coordinator, LoopSettings};
pub use self::worker::{MiningLoop, StepOutcome};
