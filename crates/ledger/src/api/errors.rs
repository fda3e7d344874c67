//! Unified error types surfaced by the ledger API.
//!
//! Wraps failures from worker coordination, repositories, and the archive
//! manager so callers can report them back over the chat transport.
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::archive::ArchiveError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no eligible co-actor: at least one user other than the credited one is required")]
    NoEligibleCoActor,

    #[error("too many co-actors: {given} given, at most {max} allowed")]
    TooManyCoActors { given: usize, max: usize },

    #[error("cooldown active: {}s remaining", remaining.as_secs())]
    CooldownActive { remaining: Duration },

    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("ledger worker command channel closed")]
    CommandChannelClosed,

    #[error("ledger worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("ledger worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LedgerError {
    /// Returns true for outcomes that reject a request without anything
    /// having gone wrong (validation, cooldown, authorization).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NoEligibleCoActor
                | Self::TooManyCoActors { .. }
                | Self::CooldownActive { .. }
                | Self::Unauthorized
        )
    }

    /// Remaining wait time when the request hit the cooldown gate.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        match self {
            Self::CooldownActive { remaining } => Some(*remaining),
            _ => None,
        }
    }
}
