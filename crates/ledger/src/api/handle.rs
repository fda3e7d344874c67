//! Cloneable façade for issuing commands to the ledger.
//!
//! [`LedgerHandle`] hides channel plumbing and offers one async method per
//! operation exposed to the command dispatcher. Admin operations take the
//! dispatcher's authorization decision as a plain flag; the ledger does not
//! look up roles itself.
use chrono::NaiveDateTime;
use tokio::sync::{mpsc, oneshot};

use super::errors::{LedgerError, Result};
use super::types::{ArchiveOutcome, Category, RestoreOutcome, TransactionOutcome, UserId};
use crate::workers::Command;

/// Client-facing handle to interact with the ledger
#[derive(Clone)]
pub struct LedgerHandle {
    command_tx: mpsc::Sender<Command>,
}

impl LedgerHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Record that `credited` was chocoblasted by `co_actors`.
    pub async fn chocoblast(
        &self,
        credited: UserId,
        co_actors: Vec<UserId>,
        now: NaiveDateTime,
    ) -> Result<TransactionOutcome> {
        self.request(|reply| Command::Chocoblast {
            credited,
            co_actors,
            now,
            reply,
        })
        .await?
    }

    /// Highest scores of a category, best first.
    ///
    /// `limit = None` uses the configured leaderboard size.
    pub async fn leaderboard(
        &self,
        category: Category,
        limit: Option<usize>,
    ) -> Result<Vec<(UserId, u64)>> {
        self.request(|reply| Command::Leaderboard {
            category,
            limit,
            reply,
        })
        .await
    }

    /// Add `delta` (possibly negative) to a user's score, clamped at zero.
    ///
    /// Returns the new score.
    pub async fn adjust_score(
        &self,
        category: Category,
        user: UserId,
        delta: i64,
        authorized: bool,
    ) -> Result<u64> {
        ensure_authorized(authorized, "adjust_score")?;
        self.request(|reply| Command::AdjustScore {
            category,
            user,
            delta,
            reply,
        })
        .await?
    }

    /// Write a manual archive of both stores.
    pub async fn backup(&self, now: NaiveDateTime, authorized: bool) -> Result<ArchiveOutcome> {
        ensure_authorized(authorized, "backup")?;
        self.request(|reply| Command::Backup { now, reply }).await?
    }

    /// Archive both stores into `reset_score/`, then empty them.
    pub async fn reset_scores(
        &self,
        now: NaiveDateTime,
        authorized: bool,
    ) -> Result<ArchiveOutcome> {
        ensure_authorized(authorized, "reset_scores")?;
        self.request(|reply| Command::ResetScores { now, reply })
            .await?
    }

    /// Restore both stores from the most recent archive.
    pub async fn restore_last(&self, authorized: bool) -> Result<RestoreOutcome> {
        ensure_authorized(authorized, "restore_last")?;
        self.request(|reply| Command::RestoreLast { reply }).await?
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| LedgerError::CommandChannelClosed)?;

        reply_rx.await.map_err(LedgerError::ReplyChannelClosed)
    }
}

fn ensure_authorized(authorized: bool, operation: &str) -> Result<()> {
    if authorized {
        Ok(())
    } else {
        tracing::warn!("Rejected unauthorized {} request", operation);
        Err(LedgerError::Unauthorized)
    }
}
