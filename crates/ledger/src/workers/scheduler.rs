//! Monthly archive scheduler.
//!
//! Ticks once per configured period of process uptime (24 h by default,
//! first tick immediately at start-up). The period is not aligned to the
//! calendar: a tick that never lands on the 1st of a month means that
//! month's archive is skipped. The deterministic monthly file name makes
//! repeated ticks on the same day, and restarts, idempotent.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use tokio::sync::watch;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::api::MonthlyOutcome;
use crate::archive::{self, ArchiveKind, ArchiveManager};
use crate::clock::Clock;

/// Run one monthly check at `now`.
///
/// Writes `chocoblast_01_<YYYY-MM>.json` when `now` is the first day of the
/// month and that file does not exist yet.
pub fn check_monthly(
    archives: &ArchiveManager,
    now: NaiveDateTime,
) -> archive::Result<MonthlyOutcome> {
    if now.day() != 1 {
        return Ok(MonthlyOutcome::NotDue);
    }

    let path = archives.path_for(ArchiveKind::Monthly, now);
    if path.exists() {
        return Ok(MonthlyOutcome::AlreadyArchived(path));
    }

    let outcome = archives.archive(ArchiveKind::Monthly, now)?;
    Ok(MonthlyOutcome::Archived(outcome.path))
}

/// Background task that triggers the monthly archive.
pub struct MonthlyArchiveWorker {
    archives: Arc<ArchiveManager>,
    clock: Arc<dyn Clock>,
    period: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl MonthlyArchiveWorker {
    pub fn new(
        archives: Arc<ArchiveManager>,
        clock: Arc<dyn Clock>,
        period: Duration,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            archives,
            clock,
            period,
            shutdown_rx,
        }
    }

    /// Main worker loop. Failures are logged and never end the loop.
    pub async fn run(mut self) {
        info!(
            "MonthlyArchiveWorker started (period: {}s)",
            self.period.as_secs()
        );

        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("MonthlyArchiveWorker stopped");
    }

    async fn tick(&self) {
        let now = self.clock.now();
        let archives = Arc::clone(&self.archives);

        match tokio::task::spawn_blocking(move || check_monthly(&archives, now)).await {
            Ok(Ok(MonthlyOutcome::Archived(path))) => {
                info!("Monthly archive written: {}", path.display());
            }
            Ok(Ok(MonthlyOutcome::AlreadyArchived(path))) => {
                debug!("Monthly archive already present: {}", path.display());
            }
            Ok(Ok(MonthlyOutcome::NotDue)) => {
                debug!("Monthly archive not due on {}", now.date());
            }
            Ok(Err(e)) => error!("Monthly archive failed: {}", e),
            Err(e) => error!("Monthly archive task failed: {}", e),
        }
    }
}
