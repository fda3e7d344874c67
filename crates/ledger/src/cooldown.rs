//! Per-user throttle on scoring transactions.
//!
//! Entries live in process memory only and are lost on restart. An entry is
//! written when a transaction is accepted, never on a rejected attempt.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::api::UserId;

/// Default time a user must wait between two scoring transactions.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(180);

/// Outcome of a cooldown check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownStatus {
    Allowed,
    Blocked { remaining: Duration },
}

/// Last accepted transaction time per user.
#[derive(Debug)]
pub struct CooldownGate {
    duration: Duration,
    entries: HashMap<UserId, NaiveDateTime>,
}

impl CooldownGate {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            entries: HashMap::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Check whether `user` may start a transaction at `now`.
    ///
    /// A clock that moved backwards counts as zero elapsed time.
    pub fn check(&self, user: &UserId, now: NaiveDateTime) -> CooldownStatus {
        let Some(last) = self.entries.get(user) else {
            return CooldownStatus::Allowed;
        };

        let elapsed = (now - *last).to_std().unwrap_or(Duration::ZERO);
        if elapsed >= self.duration {
            CooldownStatus::Allowed
        } else {
            CooldownStatus::Blocked {
                remaining: self.duration - elapsed,
            }
        }
    }

    /// Start a new cooldown window for `user` at `now` (last write wins).
    pub fn record(&mut self, user: &UserId, now: NaiveDateTime) {
        self.entries.insert(user.clone(), now);
    }

    /// [`check`](Self::check), recording `now` only when allowed.
    pub fn check_and_start(&mut self, user: &UserId, now: NaiveDateTime) -> CooldownStatus {
        let status = self.check(user, now);
        if status == CooldownStatus::Allowed {
            self.record(user, now);
        }
        status
    }

    /// Time of the last accepted transaction for `user`, if any.
    pub fn last_started(&self, user: &UserId) -> Option<NaiveDateTime> {
        self.entries.get(user).copied()
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
