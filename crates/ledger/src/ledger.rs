//! High-level ledger orchestrator.
//!
//! The ledger owns background workers, wires up the command channel, and
//! exposes a builder-based API for the bot process to start and stop it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::{LedgerError, LedgerHandle, Result};
use crate::archive::ArchiveManager;
use crate::clock::{Clock, SystemClock};
use crate::cooldown::{CooldownGate, DEFAULT_COOLDOWN};
use crate::repository::{CounterRepository, FileCounterRepository};
use crate::scoring::ScoringService;
use crate::workers::{LedgerWorker, MonthlyArchiveWorker};

/// Ledger configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Directory holding `chocoblasteds.json` and `blagueurs.json`.
    pub data_dir: PathBuf,
    /// Archive root; pre-reset archives go to its `reset_score/` child.
    pub archive_dir: PathBuf,
    pub cooldown: Duration,
    /// Interval between monthly-archive checks.
    pub scheduler_period: Duration,
    pub leaderboard_size: usize,
    pub command_buffer_size: usize,
    /// Run the monthly archive scheduler (default: true)
    pub enable_scheduler: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            archive_dir: PathBuf::from("archives_chocoblast"),
            cooldown: DEFAULT_COOLDOWN,
            scheduler_period: Duration::from_secs(24 * 60 * 60),
            leaderboard_size: 10,
            command_buffer_size: 32,
            enable_scheduler: true,
        }
    }
}

/// Running ledger: workers plus the handle callers use to reach them.
pub struct Ledger {
    handle: LedgerHandle,
    shutdown_tx: watch::Sender<bool>,
    ledger_worker_handle: JoinHandle<()>,
    scheduler_worker_handle: Option<JoinHandle<()>>,
}

impl Ledger {
    /// Create a new ledger builder
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::new()
    }

    /// Start a ledger with file-backed stores and the system clock.
    pub async fn start(config: LedgerConfig) -> Result<Self> {
        Self::builder().config(config).start().await
    }

    /// Get a cloneable handle to this ledger
    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Stop both workers and wait for them to finish.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);

        self.ledger_worker_handle
            .await
            .map_err(LedgerError::WorkerJoin)?;
        if let Some(handle) = self.scheduler_worker_handle {
            handle.await.map_err(LedgerError::WorkerJoin)?;
        }

        tracing::info!("Ledger shut down");
        Ok(())
    }
}

/// Builder for [`Ledger`].
#[derive(Default)]
pub struct LedgerBuilder {
    config: LedgerConfig,
    counters: Option<Arc<dyn CounterRepository>>,
    clock: Option<Arc<dyn Clock>>,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom counter repository instead of files under `data_dir`.
    pub fn counters(mut self, counters: Arc<dyn CounterRepository>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Clock read by the scheduler (default: [`SystemClock`]).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Create the archive layout and spawn the workers.
    pub async fn start(self) -> Result<Ledger> {
        let config = self.config;

        let counters: Arc<dyn CounterRepository> = match self.counters {
            Some(counters) => counters,
            None => Arc::new(FileCounterRepository::new(&config.data_dir)?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let archives = Arc::new(ArchiveManager::new(
            Arc::clone(&counters),
            config.archive_dir.clone(),
        ));
        archives.ensure_layout()?;

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scoring = ScoringService::new(Arc::clone(&counters), CooldownGate::new(config.cooldown));
        let ledger_worker = LedgerWorker::new(
            Arc::clone(&counters),
            Arc::clone(&archives),
            scoring,
            config.leaderboard_size,
            command_rx,
            shutdown_rx.clone(),
        );
        let ledger_worker_handle = tokio::spawn(ledger_worker.run());

        let scheduler_worker_handle = if config.enable_scheduler {
            let worker = MonthlyArchiveWorker::new(
                archives,
                clock,
                config.scheduler_period,
                shutdown_rx,
            );
            Some(tokio::spawn(worker.run()))
        } else {
            None
        };

        tracing::info!(
            "Ledger started (data: {}, archives: {})",
            config.data_dir.display(),
            config.archive_dir.display()
        );

        Ok(Ledger {
            handle: LedgerHandle::new(command_tx),
            shutdown_tx,
            ledger_worker_handle,
            scheduler_worker_handle,
        })
    }
}
