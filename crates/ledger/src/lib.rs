//! Score ledger and archive subsystem for the chocoblast leaderboard bot.
//!
//! This crate keeps two leaderboards (users who were chocoblasted, and the
//! blagueurs who pulled it off), gates scoring behind a per-user cooldown,
//! and writes point-in-time archives that can be restored later. Consumers
//! start a [`Ledger`] and talk to it through [`LedgerHandle`].
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the types the command dispatcher interacts with
//! - [`repository`] persists the per-category counter stores
//! - [`archive`] writes and restores archive files
//! - [`cooldown`] and [`scoring`] hold the transaction logic
//! - [`clock`] abstracts wall-clock time for the scheduler
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod archive;
pub mod clock;
pub mod cooldown;
pub mod ledger;
pub mod repository;
pub mod scoring;

mod utils;
mod workers;

pub use api::{
    ArchiveOutcome, Category, LedgerError, LedgerHandle, MonthlyOutcome, RestoreOutcome, Result,
    Scores, TransactionOutcome, UserId,
};
pub use archive::{ArchiveError, ArchiveKind, ArchiveManager, ArchiveRecord};
pub use clock::{Clock, FixedClock, SystemClock};
pub use cooldown::{CooldownGate, CooldownStatus, DEFAULT_COOLDOWN};
pub use ledger::{Ledger, LedgerBuilder, LedgerConfig};
pub use repository::{
    CounterRepository, FileCounterRepository, InMemoryCounterRepo, RepositoryError,
};
pub use scoring::{MAX_CO_ACTORS, ScoringService};
pub use workers::check_monthly;
