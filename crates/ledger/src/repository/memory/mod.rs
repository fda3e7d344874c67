//! In-memory repository implementations.

mod counter;

pub use counter::InMemoryCounterRepo;
