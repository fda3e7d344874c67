//! Repository layer for the leaderboard counters.
//!
//! Each [`Category`](crate::Category) is backed by one whole-file snapshot.
//! Stores are loaded fully on every access and rewritten in full on every
//! mutation; there is no append log.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileCounterRepository;
pub use memory::InMemoryCounterRepo;
pub use traits::CounterRepository;
