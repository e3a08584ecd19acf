// src/utils/mod.rs
//! Shared error types and logging setup

/// Error types for collaborators, the shared store, the loop and startup
pub mod error;

/// Logging initialization
pub mod logging;

pub use error::{ClientError, CoordinatorError, LoopError, StoreError};
pub use logging::init_logging;
