//! Public API surface consumed by the command dispatcher.
//!
//! - [`types`] holds identifiers, categories and operation outcomes
//! - [`errors`] defines the [`LedgerError`] taxonomy
//! - [`handle`] is the cloneable façade over the ledger worker

mod errors;
mod handle;
mod types;

pub use errors::{ArchiveError, LedgerError, RepositoryError, Result};
pub use handle::LedgerHandle;
pub use types::{
    ArchiveOutcome, Category, MonthlyOutcome, RestoreOutcome, Scores, TransactionOutcome, UserId,
};
