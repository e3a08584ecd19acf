// src/miner/coordinator.rs
//! Mining lifecycle state machine and control surface
//!
//! [`Coordinator`] is the only owner of the Idle/Running state. Callers
//! start, stop and read statistics through it; the background loop reads
//! the state at every iteration and writes its progress back through the
//! same lock.

use crate::config::Config;
use crate::miner::worker::{MiningLoop, StepOutcome};
use crate::network::ComputeService;
use crate::stats::{StatsAggregator, metrics};
use crate::store::{
    KEY_MINING_ACTIVE, KEY_MINING_RATE, KEY_RECENT_MINES, KEY_TOTAL_BLOCKS, STARTUP_KEYS,
    SharedStore,
};
use crate::types::{
    AggregateStats, ControlStatus, ErrorCounts, HealthReport, MiningResult, MiningState,
};
use crate::utils::error::{LoopError, StoreError};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fixed parameters of the mining loop
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Hash rounds requested from the hash engine
    pub difficulty: u32,
    /// Sleep between iterations
    pub pacing: Duration,
    /// Rolling window length
    pub window_size: usize,
    /// Expiry of stored results
    pub result_ttl: Duration,
    /// Length of the recent results list
    pub recent_results: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        LoopSettings {
            difficulty: 1,
            pacing: Duration::from_millis(100),
            window_size: crate::stats::DEFAULT_WINDOW_SIZE,
            result_ttl: Duration::from_secs(3600),
            recent_results: 100,
        }
    }
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        LoopSettings {
            difficulty: config.difficulty,
            pacing: Duration::from_millis(config.pacing_ms),
            window_size: config.window_size,
            result_ttl: Duration::from_secs(config.result_ttl_secs),
            recent_results: config.recent_results,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ErrorCounters {
    pub(crate) rng: AtomicU64,
    pub(crate) hash: AtomicU64,
    pub(crate) fatal: AtomicU64,
}

/// Everything the state lock protects
struct Control {
    state: MiningState,
    generation: u64,
    aggregator: StatsAggregator,
    task: Option<JoinHandle<()>>,
}

impl Control {
    fn is_current(&self, generation: u64) -> bool {
        self.state.is_running() && self.generation == generation
    }

    fn snapshot(&self) -> AggregateStats {
        let mut stats = self.aggregator.snapshot(self.state.is_running());
        if !stats.is_mining {
            stats.mining_rate = 0.0;
        }
        stats
    }
}

/// State shared between the coordinator and its loop tasks
pub(crate) struct Shared<C, S> {
    pub(crate) compute: C,
    pub(crate) store: S,
    pub(crate) settings: LoopSettings,
    pub(crate) errors: ErrorCounters,
    pub(crate) active_loops: AtomicUsize,
    control: Mutex<Control>,
    /// Last published snapshot, readable without the state lock
    published: ArcSwap<AggregateStats>,
    /// Serializes start/stop including their store writes
    commands: tokio::sync::Mutex<()>,
}

impl<C, S> Shared<C, S> {
    fn control(&self) -> MutexGuard<'_, Control> {
        // state stays consistent even if a holder panicked
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, control: &Control) {
        self.published.store(Arc::new(control.snapshot()));
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.control().is_current(generation)
    }

    /// Adds a computation time to the window
    ///
    /// The returned rate is zero when `generation` is no longer current, so
    /// a tail iteration finishing after stop never republishes a rate.
    pub(crate) fn record(&self, computation_time: f64, generation: u64) -> AggregateStats {
        let mut control = self.control();
        let current = control.is_current(generation);
        let mut stats = control.aggregator.record(computation_time, current);
        if !current {
            stats.mining_rate = 0.0;
        }
        self.publish(&control);
        stats
    }
}

impl<C: ComputeService, S: SharedStore> Shared<C, S> {
    /// Fatal escape: forces Idle if `generation` still owns the state
    ///
    /// Holds the command lock until the idle state is written, so a start
    /// issued meanwhile publishes `mining_active=1` after it.
    pub(crate) async fn abort(&self, generation: u64) {
        self.errors.fatal.fetch_add(1, Ordering::Relaxed);
        metrics::LOOP_FAILURES.inc();

        let _command = self.commands.lock().await;
        let owned = {
            let mut control = self.control();
            let owned = control.is_current(generation);
            if owned {
                control.state = MiningState::Idle;
                self.publish(&control);
            }
            owned
        };
        if !owned {
            return;
        }

        metrics::set_active(false);
        if let Err(e) = self.persist_idle().await {
            log::warn!("Could not publish idle state after loop failure: {}", e);
        }
        log::error!("Mining stopped after an unrecoverable error; restart it manually");
    }

    async fn persist_idle(&self) -> Result<(), StoreError> {
        self.store.set(KEY_MINING_ACTIVE, "0".to_string()).await?;
        self.store.set(KEY_MINING_RATE, "0".to_string()).await
    }
}

/// Owner of the mining state machine
///
/// Cheap to clone; clones control the same loop.
pub struct Coordinator<C, S> {
    shared: Arc<Shared<C, S>>,
}

impl<C, S> Clone for Coordinator<C, S> {
    fn clone(&self) -> Self {
        Coordinator {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: ComputeService, S: SharedStore> Coordinator<C, S> {
    /// Creates an idle coordinator around injected collaborators
    pub fn new(compute: C, store: S, settings: LoopSettings) -> Self {
        let aggregator = StatsAggregator::new(settings.window_size);
        let control = Control {
            state: MiningState::Idle,
            generation: 0,
            aggregator,
            task: None,
        };
        let published = ArcSwap::from_pointee(control.snapshot());

        Coordinator {
            shared: Arc::new(Shared {
                compute,
                store,
                settings,
                errors: ErrorCounters::default(),
                active_loops: AtomicUsize::new(0),
                control: Mutex::new(control),
                published,
                commands: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Idle → Running; spawns the loop on the current tokio runtime
    pub async fn start(&self) -> ControlStatus {
        let _command = self.shared.commands.lock().await;

        let generation = {
            let mut control = self.shared.control();
            if control.state.is_running() {
                return ControlStatus::AlreadyRunning;
            }
            control.state = MiningState::Running;
            control.generation += 1;
            let generation = control.generation;

            let task = MiningLoop::new(Arc::clone(&self.shared), generation);
            // a previous loop may still finish its tail iteration; it is
            // no longer current and exits on its own
            control.task = Some(tokio::spawn(task.run()));
            self.shared.publish(&control);
            generation
        };

        metrics::set_active(true);
        if let Err(e) = self
            .shared
            .store
            .set(KEY_MINING_ACTIVE, "1".to_string())
            .await
        {
            log::warn!("Could not publish mining_active=1: {}", e);
        }

        log::info!("Mining started (run #{})", generation);
        ControlStatus::Started
    }

    /// Running → Idle
    ///
    /// Cooperative: an iteration already in flight may still be recorded.
    pub async fn stop(&self) -> ControlStatus {
        let _command = self.shared.commands.lock().await;

        let generation = {
            let mut control = self.shared.control();
            if !control.state.is_running() {
                return ControlStatus::NotRunning;
            }
            control.state = MiningState::Idle;
            self.shared.publish(&control);
            control.generation
        };

        metrics::set_active(false);
        if let Err(e) = self.shared.persist_idle().await {
            log::warn!("Could not publish idle state: {}", e);
        }

        log::info!("Mining stopped (run #{})", generation);
        ControlStatus::Stopped
    }

    /// Totals as seen by outside readers
    ///
    /// `total_blocks` and `mining_rate` come from the shared store. If the
    /// store cannot be read the in-memory snapshot is returned with
    /// `degraded` set.
    pub async fn stats(&self) -> AggregateStats {
        let local = self.snapshot();

        match self.read_store_totals().await {
            Ok((total_blocks, mining_rate)) => AggregateStats {
                total_blocks,
                mining_rate: if local.is_mining { mining_rate } else { 0.0 },
                is_mining: local.is_mining,
                degraded: false,
            },
            Err(e) => {
                log::warn!("Degraded stats read, serving in-memory values: {}", e);
                AggregateStats {
                    degraded: true,
                    ..local
                }
            }
        }
    }

    async fn read_store_totals(&self) -> Result<(u64, f64), StoreError> {
        let store = &self.shared.store;
        let total = store.get(KEY_TOTAL_BLOCKS).await?;
        let rate = store.get(KEY_MINING_RATE).await?;
        Ok((parse_or_zero(KEY_TOTAL_BLOCKS, total)?, parse_or_zero(KEY_MINING_RATE, rate)?))
    }

    /// In-memory totals, no store access
    pub fn snapshot(&self) -> AggregateStats {
        AggregateStats::clone(&self.shared.published.load())
    }

    /// Liveness probe
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            is_mining: self.snapshot().is_mining,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> MiningState {
        self.shared.control().state
    }

    /// Clears in-memory totals and the store keys left by a previous run
    ///
    /// Meant for process startup only.
    pub async fn reset(&self) -> Result<(), StoreError> {
        {
            let mut control = self.shared.control();
            control.aggregator.reset();
            self.shared.publish(&control);
        }
        self.shared.store.delete(&STARTUP_KEYS).await?;
        log::info!("Cleared stats from previous runs");
        Ok(())
    }

    /// Waits for the most recently started loop task to finish
    ///
    /// Returns immediately if no loop was started since the last join.
    /// While mining is running this only returns after a stop or a fatal
    /// loop error.
    pub async fn join_loop(&self) {
        let task = self.shared.control().task.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::error!("Mining loop task failed: {}", e);
            }
        }
    }

    /// Runs a single iteration while idle
    ///
    /// Refused with [`LoopError::Running`] while the background loop is
    /// running. Start and stop wait for the iteration to finish. The run is
    /// not current, so the recorded rate is zero.
    pub async fn mine_once(&self) -> Result<StepOutcome, LoopError> {
        let _command = self.shared.commands.lock().await;
        let generation = {
            let control = self.shared.control();
            if control.state.is_running() {
                return Err(LoopError::Running);
            }
            control.generation
        };
        MiningLoop::new(Arc::clone(&self.shared), generation)
            .step()
            .await
    }

    /// Recently recorded results, oldest first
    ///
    /// Entries that fail to decode are skipped.
    pub async fn recent_results(&self) -> Result<Vec<MiningResult>, StoreError> {
        let raw = self.shared.store.list(KEY_RECENT_MINES).await?;
        Ok(raw
            .iter()
            .filter_map(|entry| match serde_json::from_str(entry) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Skipping undecodable result entry: {}", e);
                    None
                }
            })
            .collect())
    }

    /// Collaborator and loop failure counters
    pub fn error_counts(&self) -> ErrorCounts {
        let errors = &self.shared.errors;
        ErrorCounts {
            rng_errors: errors.rng.load(Ordering::Relaxed),
            hash_errors: errors.hash.load(Ordering::Relaxed),
            fatal_errors: errors.fatal.load(Ordering::Relaxed),
        }
    }

    /// Loop tasks that have not finished yet
    pub fn active_loops(&self) -> usize {
        self.shared.active_loops.load(Ordering::SeqCst)
    }

    /// Samples currently in the rolling window
    pub fn window_len(&self) -> usize {
        self.shared.control().aggregator.window_len()
    }
}

fn parse_or_zero<T>(key: &str, value: Option<String>) -> Result<T, StoreError>
where
    T: std::str::FromStr + Default,
{
    match value {
        None => Ok(T::default()),
        Some(raw) => raw.trim().parse().map_err(|_| StoreError::Parse {
            key: key.to_string(),
            value: raw,
        }),
    }
}
