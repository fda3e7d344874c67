//! Repository contract for the per-category counter stores.

use crate::api::{Category, Scores, UserId};

use super::Result;

/// Repository for leaderboard counters.
///
/// Every mutation is a whole-mapping `load` → modify → `save`. The provided
/// methods are not locked across that sequence: two callers incrementing the
/// same category concurrently can lose an update (last `save` wins). The
/// ledger worker serializes its own calls; direct users must do the same if
/// they care.
pub trait CounterRepository: Send + Sync {
    /// Load the full mapping for a category.
    ///
    /// Never fails: missing, unreadable or corrupt storage yields an empty
    /// mapping.
    fn load(&self, category: Category) -> Scores;

    /// Overwrite the stored mapping for a category in full.
    ///
    /// Readers observe either the previous or the new mapping, never a
    /// partially written one.
    fn save(&self, category: Category, scores: &Scores) -> Result<()>;

    /// Apply `delta` to one user's score, clamping at zero.
    ///
    /// Returns the new score.
    fn increment(&self, category: Category, user: &UserId, delta: i64) -> Result<u64> {
        let mut scores = self.load(category);
        let score = apply_delta(&mut scores, user, delta);
        self.save(category, &scores)?;
        Ok(score)
    }

    /// Apply `delta` to each user with a single load and save.
    fn increment_many(&self, category: Category, users: &[UserId], delta: i64) -> Result<()> {
        let mut scores = self.load(category);
        for user in users {
            apply_delta(&mut scores, user, delta);
        }
        self.save(category, &scores)
    }

    /// Reset a category to an empty mapping.
    fn clear(&self, category: Category) -> Result<()> {
        self.save(category, &Scores::new())
    }

    /// Highest scores first, truncated to `limit` entries.
    ///
    /// Ties keep the mapping's iteration order.
    fn top(&self, category: Category, limit: usize) -> Vec<(UserId, u64)> {
        let mut entries: Vec<(UserId, u64)> = self.load(category).into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        entries
    }
}

fn apply_delta(scores: &mut Scores, user: &UserId, delta: i64) -> u64 {
    let entry = scores.entry(user.clone()).or_insert(0);
    *entry = if delta >= 0 {
        entry.saturating_add(delta.unsigned_abs())
    } else {
        entry.saturating_sub(delta.unsigned_abs())
    };
    *entry
}
