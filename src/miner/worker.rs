// src/miner/worker.rs
//! The mining loop
//!
//! One [`MiningLoop`] runs per effective start. It keeps iterating while
//! the coordinator is running *and* its own run generation is still the
//! current one, so a quick stop/start never leaves two loops counting.

use crate::miner::coordinator::Shared;
use crate::network::ComputeService;
use crate::stats::metrics;
use crate::store::{self, KEY_MINING_RATE, KEY_RECENT_MINES, KEY_TOTAL_BLOCKS, SharedStore};
use crate::types::{AggregateStats, MiningResult};
use crate::utils::error::{LoopError, StoreError};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// What a single iteration did
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Both calls succeeded and the result was recorded
    Mined(MiningResult),
    /// The random source failed; nothing was recorded
    RandomFailed,
    /// The hash engine failed; nothing was recorded
    HashFailed,
}

/// Background task driving fetch → hash → record → pace
pub struct MiningLoop<C, S> {
    shared: Arc<Shared<C, S>>,
    generation: u64,
}

impl<C: ComputeService, S: SharedStore> MiningLoop<C, S> {
    /// Counts itself as a live loop until dropped
    pub(crate) fn new(shared: Arc<Shared<C, S>>, generation: u64) -> Self {
        shared.active_loops.fetch_add(1, Ordering::SeqCst);
        MiningLoop { shared, generation }
    }

    /// Iterates until stopped, superseded or aborted by a fatal error
    pub async fn run(self) {
        let pacing = self.shared.settings.pacing;
        log::info!("Mining loop #{} started", self.generation);

        while self.shared.is_current(self.generation) {
            if let Err(e) = self.step().await {
                log::error!("Mining loop #{} aborted: {}", self.generation, e);
                self.shared.abort(self.generation).await;
                return;
            }
            tokio::time::sleep(pacing).await;
        }

        log::info!("Mining loop #{} exited", self.generation);
    }

    /// Performs one fetch-then-hash iteration without pacing
    ///
    /// Collaborator failures are counted and reported as outcomes; only a
    /// failure to persist progress is returned as an error.
    pub async fn step(&self) -> Result<StepOutcome, LoopError> {
        let shared = &self.shared;

        let number = match shared.compute.fetch_random().await {
            Ok(number) => number,
            Err(e) => {
                shared.errors.rng.fetch_add(1, Ordering::Relaxed);
                metrics::RNG_REQUEST_ERRORS.inc();
                log::warn!("RNG request error: {}", e);
                return Ok(StepOutcome::RandomFailed);
            }
        };

        let difficulty = shared.settings.difficulty;
        let outcome = match shared.compute.compute_hash(number, difficulty).await {
            Ok(outcome) => outcome,
            Err(e) => {
                shared.errors.hash.fetch_add(1, Ordering::Relaxed);
                metrics::HASH_REQUEST_ERRORS.inc();
                log::warn!("Hash request error for {}: {}", number, e);
                return Ok(StepOutcome::HashFailed);
            }
        };

        let result = MiningResult {
            timestamp: Utc::now(),
            input_number: number,
            hash_hex: outcome.hash_hex,
            computation_time: outcome.computation_time,
        };
        let stats = shared.record(result.computation_time, self.generation);
        self.persist(&result, &stats).await?;

        log::debug!(
            "Block {} mined: number={} hash={} time={:.4}s rate={:.2}/s",
            stats.total_blocks,
            result.input_number,
            result.hash_hex,
            result.computation_time,
            stats.mining_rate
        );
        Ok(StepOutcome::Mined(result))
    }

    async fn persist(&self, result: &MiningResult, stats: &AggregateStats) -> Result<(), LoopError> {
        let shared = &self.shared;
        let settings = &shared.settings;

        metrics::BLOCKS_MINED.inc();
        metrics::MINING_RATE.set(stats.mining_rate);

        shared.store.incr(KEY_TOTAL_BLOCKS).await?;
        shared
            .store
            .set(KEY_MINING_RATE, stats.mining_rate.to_string())
            .await?;

        let encoded = serde_json::to_string(result).map_err(StoreError::from)?;
        shared
            .store
            .set_ex(
                &store::result_key(stats.total_blocks),
                encoded.clone(),
                settings.result_ttl,
            )
            .await?;
        shared
            .store
            .push_capped(
                KEY_RECENT_MINES,
                encoded,
                settings.recent_results,
                settings.result_ttl,
            )
            .await?;
        Ok(())
    }
}

impl<C, S> Drop for MiningLoop<C, S> {
    fn drop(&mut self) {
        self.shared.active_loops.fetch_sub(1, Ordering::SeqCst);
    }
}
