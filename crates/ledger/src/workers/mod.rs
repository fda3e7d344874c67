//! Worker tasks that back the ledger.
//!
//! The ledger worker owns the cooldown gate and serializes score mutations,
//! while the scheduler writes the monthly archive in the background.

mod ledger;
mod scheduler;

pub use ledger::{Command, LedgerWorker};
pub use scheduler::{MonthlyArchiveWorker, check_monthly};
