// src/network/mod.rs
//! Clients for the collaborator services
//!
//! The mining loop talks to a random-number source and a hash engine over
//! HTTP. Both are reached through the [`ComputeService`] trait so the loop
//! can be driven by a scripted fake in tests.

/// HTTP client for the random source and the hash engine
pub mod compute;

pub use compute::{ComputeService, HashOutcome, HttpComputeClient};
