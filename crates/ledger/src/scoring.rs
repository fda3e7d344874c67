//! Scoring transaction: one chocoblast credited to one user and to 1–3
//! co-actors.
//!
//! This is the only place counters move other than admin edits and restore.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::api::{Category, LedgerError, Result, TransactionOutcome, UserId};
use crate::cooldown::{CooldownGate, CooldownStatus};
use crate::repository::CounterRepository;

/// Maximum number of distinct co-actors per transaction.
pub const MAX_CO_ACTORS: usize = 3;

/// Applies scoring transactions against the counter stores, gated by a
/// per-user cooldown.
pub struct ScoringService {
    counters: Arc<dyn CounterRepository>,
    cooldown: CooldownGate,
}

impl ScoringService {
    pub fn new(counters: Arc<dyn CounterRepository>, cooldown: CooldownGate) -> Self {
        Self { counters, cooldown }
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    /// Credit `credited` as chocoblasted and each co-actor as blagueur.
    ///
    /// Co-actors are de-duplicated in order and `credited` is removed from
    /// them. Validation happens before the cooldown is consulted, so an
    /// invalid request neither checks nor starts a cooldown window.
    pub fn apply(
        &mut self,
        credited: &UserId,
        co_actors: &[UserId],
        now: NaiveDateTime,
    ) -> Result<TransactionOutcome> {
        let co_actors = eligible_co_actors(credited, co_actors);
        if co_actors.is_empty() {
            return Err(LedgerError::NoEligibleCoActor);
        }
        if co_actors.len() > MAX_CO_ACTORS {
            return Err(LedgerError::TooManyCoActors {
                given: co_actors.len(),
                max: MAX_CO_ACTORS,
            });
        }

        if let CooldownStatus::Blocked { remaining } = self.cooldown.check(credited, now) {
            tracing::debug!(
                "Chocoblast by {} rejected, cooldown {}s remaining",
                credited,
                remaining.as_secs()
            );
            return Err(LedgerError::CooldownActive { remaining });
        }

        self.cooldown.record(credited, now);

        let credited_total = self
            .counters
            .increment(Category::Chocoblasted, credited, 1)?;
        self.counters
            .increment_many(Category::Blagueur, &co_actors, 1)?;

        tracing::info!(
            "Chocoblast recorded: {} (total {}), blagueurs: {:?}",
            credited,
            credited_total,
            co_actors.iter().map(UserId::as_str).collect::<Vec<_>>()
        );

        Ok(TransactionOutcome {
            credited: credited.clone(),
            credited_total,
            co_actors,
        })
    }
}

fn eligible_co_actors(credited: &UserId, co_actors: &[UserId]) -> Vec<UserId> {
    let mut eligible: Vec<UserId> = Vec::with_capacity(co_actors.len());
    for user in co_actors {
        if user != credited && !eligible.contains(user) {
            eligible.push(user.clone());
        }
    }
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCounterRepo;
    use chrono::{NaiveDate, TimeDelta};
    use std::time::Duration;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<UserId> {
        raw.iter().map(|id| UserId::new(*id)).collect()
    }

    fn setup() -> (Arc<InMemoryCounterRepo>, ScoringService) {
        let counters = Arc::new(InMemoryCounterRepo::new());
        let service = ScoringService::new(counters.clone(), CooldownGate::default());
        (counters, service)
    }

    #[test]
    fn test_apply_credits_both_categories() {
        let (counters, mut service) = setup();
        let a = UserId::new("A");

        let outcome = service.apply(&a, &ids(&["B", "C"]), t0()).unwrap();

        assert_eq!(outcome.credited_total, 1);
        assert_eq!(outcome.co_actors, ids(&["B", "C"]));
        assert_eq!(counters.load(Category::Chocoblasted)[&a], 1);
        let blagueurs = counters.load(Category::Blagueur);
        assert_eq!(blagueurs[&UserId::new("B")], 1);
        assert_eq!(blagueurs[&UserId::new("C")], 1);
        assert_eq!(service.cooldown().last_started(&a), Some(t0()));
    }

    #[test]
    fn test_second_apply_within_cooldown_changes_nothing() {
        let (counters, mut service) = setup();
        let a = UserId::new("A");
        service.apply(&a, &ids(&["B", "C"]), t0()).unwrap();

        let before_choco = counters.load(Category::Chocoblasted);
        let before_blag = counters.load(Category::Blagueur);

        let err = service
            .apply(&a, &ids(&["D"]), t0() + TimeDelta::seconds(10))
            .unwrap_err();

        assert_eq!(err.cooldown_remaining(), Some(Duration::from_secs(170)));
        assert_eq!(counters.load(Category::Chocoblasted), before_choco);
        assert_eq!(counters.load(Category::Blagueur), before_blag);
        assert_eq!(service.cooldown().last_started(&a), Some(t0()));
    }

    #[test]
    fn test_self_only_is_rejected_without_cooldown() {
        let (counters, mut service) = setup();
        let a = UserId::new("A");

        let err = service.apply(&a, &ids(&["A", "A"]), t0()).unwrap_err();

        assert!(matches!(err, LedgerError::NoEligibleCoActor));
        assert!(service.cooldown().last_started(&a).is_none());
        assert!(counters.load(Category::Chocoblasted).is_empty());
    }

    #[test]
    fn test_co_actors_are_deduplicated() {
        let (counters, mut service) = setup();

        let outcome = service
            .apply(&UserId::new("A"), &ids(&["B", "A", "B"]), t0())
            .unwrap();

        assert_eq!(outcome.co_actors, ids(&["B"]));
        assert_eq!(counters.load(Category::Blagueur)[&UserId::new("B")], 1);
    }

    #[test]
    fn test_too_many_co_actors() {
        let (_counters, mut service) = setup();

        let err = service
            .apply(&UserId::new("A"), &ids(&["B", "C", "D", "E"]), t0())
            .unwrap_err();

        assert!(matches!(err, LedgerError::TooManyCoActors { given: 4, max: 3 }));
    }

    #[test]
    fn test_totals_accumulate_after_cooldown() {
        let (_counters, mut service) = setup();
        let a = UserId::new("A");

        service.apply(&a, &ids(&["B"]), t0()).unwrap();
        let outcome = service
            .apply(&a, &ids(&["B"]), t0() + TimeDelta::seconds(181))
            .unwrap();

        assert_eq!(outcome.credited_total, 2);
    }
}
