//! Ledger worker that owns the cooldown gate.
//!
//! Receives commands from [`LedgerHandle`](crate::LedgerHandle), applies them
//! to the counter stores and replies over oneshot channels. Commands are
//! processed one at a time, so scoring transactions and admin edits never
//! interleave inside a load/save cycle.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::api::{
    ArchiveOutcome, Category, LedgerError, RestoreOutcome, Result, TransactionOutcome, UserId,
};
use crate::archive::{ArchiveKind, ArchiveManager};
use crate::repository::CounterRepository;
use crate::scoring::ScoringService;

/// Commands that can be sent to the ledger worker
pub enum Command {
    /// Apply a scoring transaction.
    Chocoblast {
        credited: UserId,
        co_actors: Vec<UserId>,
        now: NaiveDateTime,
        reply: oneshot::Sender<Result<TransactionOutcome>>,
    },
    /// Read the top of a leaderboard (`None` uses the configured size).
    Leaderboard {
        category: Category,
        limit: Option<usize>,
        reply: oneshot::Sender<Vec<(UserId, u64)>>,
    },
    /// Direct admin edit of one user's score.
    AdjustScore {
        category: Category,
        user: UserId,
        delta: i64,
        reply: oneshot::Sender<Result<u64>>,
    },
    /// Write a manual archive.
    Backup {
        now: NaiveDateTime,
        reply: oneshot::Sender<Result<ArchiveOutcome>>,
    },
    /// Archive into `reset_score/`, then empty both stores.
    ResetScores {
        now: NaiveDateTime,
        reply: oneshot::Sender<Result<ArchiveOutcome>>,
    },
    /// Restore both stores from the most recent archive.
    RestoreLast {
        reply: oneshot::Sender<Result<RestoreOutcome>>,
    },
}

/// Background task that processes ledger commands.
pub struct LedgerWorker {
    counters: Arc<dyn CounterRepository>,
    archives: Arc<ArchiveManager>,
    scoring: ScoringService,
    leaderboard_size: usize,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LedgerWorker {
    pub fn new(
        counters: Arc<dyn CounterRepository>,
        archives: Arc<ArchiveManager>,
        scoring: ScoringService,
        leaderboard_size: usize,
        command_rx: mpsc::Receiver<Command>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            counters,
            archives,
            scoring,
            leaderboard_size,
            command_rx,
            shutdown_rx,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        info!(
            "LedgerWorker started (cooldown: {}s, leaderboard size: {})",
            self.scoring.cooldown().duration().as_secs(),
            self.leaderboard_size
        );

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd).await;
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                else => break,
            }
        }

        info!("LedgerWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Chocoblast {
                credited,
                co_actors,
                now,
                reply,
            } => {
                let result = self.scoring.apply(&credited, &co_actors, now);
                if reply.send(result).is_err() {
                    debug!("Chocoblast reply channel closed (caller dropped)");
                }
            }
            Command::Leaderboard {
                category,
                limit,
                reply,
            } => {
                let top = self
                    .counters
                    .top(category, limit.unwrap_or(self.leaderboard_size));
                if reply.send(top).is_err() {
                    debug!("Leaderboard reply channel closed (caller dropped)");
                }
            }
            Command::AdjustScore {
                category,
                user,
                delta,
                reply,
            } => {
                let result = self
                    .counters
                    .increment(category, &user, delta)
                    .map_err(LedgerError::from);
                if let Ok(score) = &result {
                    info!(
                        "Admin adjusted {} score of {} by {} (now {})",
                        category, user, delta, score
                    );
                }
                if reply.send(result).is_err() {
                    debug!("AdjustScore reply channel closed (caller dropped)");
                }
            }
            Command::Backup { now, reply } => self.spawn_backup(now, reply),
            Command::ResetScores { now, reply } => {
                let result = self.reset_scores(now).await;
                if reply.send(result).is_err() {
                    debug!("ResetScores reply channel closed (caller dropped)");
                }
            }
            Command::RestoreLast { reply } => {
                let result = self.restore_last().await;
                if reply.send(result).is_err() {
                    debug!("RestoreLast reply channel closed (caller dropped)");
                }
            }
        }
    }

    /// Hands the archive write to the blocking pool and replies from there,
    /// so the command loop keeps running while the file is written.
    fn spawn_backup(&self, now: NaiveDateTime, reply: oneshot::Sender<Result<ArchiveOutcome>>) {
        let archives = Arc::clone(&self.archives);

        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                archives.archive(ArchiveKind::Manual, now)
            })
            .await
            .map_err(LedgerError::WorkerJoin)
            .and_then(|result| result.map_err(LedgerError::from));

            if reply.send(result).is_err() {
                debug!("Backup reply channel closed (caller dropped)");
            }
        });
    }

    /// Pre-reset archive then empty stores. Nothing is cleared if the
    /// archive cannot be written.
    async fn reset_scores(&self, now: NaiveDateTime) -> Result<ArchiveOutcome> {
        let archives = Arc::clone(&self.archives);
        let counters = Arc::clone(&self.counters);

        tokio::task::spawn_blocking(move || -> Result<ArchiveOutcome> {
            let outcome = archives.archive(ArchiveKind::PreReset, now)?;
            for category in Category::ALL {
                counters.clear(category)?;
            }
            info!("Scores reset after archiving to {}", outcome.path.display());
            Ok(outcome)
        })
        .await
        .map_err(LedgerError::WorkerJoin)?
    }

    async fn restore_last(&self) -> Result<RestoreOutcome> {
        let archives = Arc::clone(&self.archives);

        tokio::task::spawn_blocking(move || archives.restore_latest_default())
            .await
            .map_err(LedgerError::WorkerJoin)?
            .map_err(LedgerError::from)
    }
}
