// src/store/mod.rs
//! Shared key-value store used to publish mining progress
//!
//! The store outlives the process and may be read by other services, so
//! the coordinator only ever appends or overwrites during normal operation
//! and clears its keys once at startup.

/// In-process backend with TTL expiry
pub mod memory;

/// Redis backend
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::utils::error::StoreError;
use std::future::Future;
use std::time::Duration;

/// "1" while mining, "0" otherwise
pub const KEY_MINING_ACTIVE: &str = "mining_active";
/// Integer count of recorded blocks
pub const KEY_TOTAL_BLOCKS: &str = "total_blocks";
/// Float blocks-per-second
pub const KEY_MINING_RATE: &str = "mining_rate";
/// Capped list of serialized recent results
pub const KEY_RECENT_MINES: &str = "recent_mines";

/// Keys cleared on startup
pub const STARTUP_KEYS: [&str; 4] = [
    KEY_MINING_ACTIVE,
    KEY_TOTAL_BLOCKS,
    KEY_MINING_RATE,
    KEY_RECENT_MINES,
];

/// Per-result key holding one serialized result until its TTL runs out
pub fn result_key(block: u64) -> String {
    format!("mining_result:{}", block)
}

/// Operations the coordinator needs from the shared store
pub trait SharedStore: Send + Sync + 'static {
    /// Reads a string value
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Writes a string value without expiry
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Writes a string value that expires after `ttl`
    fn set_ex(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Increments an integer value by one and returns the new value
    fn incr(&self, key: &str) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Appends to a list, keeps only the newest `cap` entries and refreshes
    /// the list's expiry to `ttl`
    fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads a whole list, oldest entry first
    fn list(&self, key: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Removes keys; missing keys are ignored
    fn delete(&self, keys: &[&str]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Store backend selected at startup
#[derive(Clone)]
pub enum StoreBackend {
    /// Redis shared with other services
    Redis(RedisStore),
    /// Process-local map; nothing outside the process can read it
    Memory(MemoryStore),
}

impl SharedStore for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            StoreBackend::Redis(s) => s.get(key).await,
            StoreBackend::Memory(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        match self {
            StoreBackend::Redis(s) => s.set(key, value).await,
            StoreBackend::Memory(s) => s.set(key, value).await,
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        match self {
            StoreBackend::Redis(s) => s.set_ex(key, value, ttl).await,
            StoreBackend::Memory(s) => s.set_ex(key, value, ttl).await,
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        match self {
            StoreBackend::Redis(s) => s.incr(key).await,
            StoreBackend::Memory(s) => s.incr(key).await,
        }
    }

    async fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        match self {
            StoreBackend::Redis(s) => s.push_capped(key, value, cap, ttl).await,
            StoreBackend::Memory(s) => s.push_capped(key, value, cap, ttl).await,
        }
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self {
            StoreBackend::Redis(s) => s.list(key).await,
            StoreBackend::Memory(s) => s.list(key).await,
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), StoreError> {
        match self {
            StoreBackend::Redis(s) => s.delete(keys).await,
            StoreBackend::Memory(s) => s.delete(keys).await,
        }
    }
}
