//! File-based repository implementations.

mod counter;

pub use counter::FileCounterRepository;
