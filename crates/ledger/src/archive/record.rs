//! Archive file contents.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::{Category, Scores};
use crate::repository::CounterRepository;

/// Point-in-time copy of both counter stores.
///
/// Serialized as:
///
/// ```text
/// {
///   "date_archive": "2025-03-01T09:30:00.123456",
///   "chocoblasteds": { "<user_id>": <score>, ... },
///   "blagueurs": { "<user_id>": <score>, ... }
/// }
/// ```
///
/// The two stores are read one after the other, so a mutation landing
/// between the reads is not reflected consistently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub date_archive: NaiveDateTime,
    pub chocoblasteds: Scores,
    pub blagueurs: Scores,
}

impl ArchiveRecord {
    /// Capture the current content of both stores.
    pub fn capture(counters: &dyn CounterRepository, now: NaiveDateTime) -> Self {
        Self {
            date_archive: now,
            chocoblasteds: counters.load(Category::Chocoblasted),
            blagueurs: counters.load(Category::Blagueur),
        }
    }
}
