//! In-memory CounterRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::api::{Category, Scores};
use crate::repository::{CounterRepository, RepositoryError, Result};

/// In-memory implementation of CounterRepository.
pub struct InMemoryCounterRepo {
    stores: RwLock<HashMap<Category, Scores>>,
}

impl InMemoryCounterRepo {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCounterRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterRepository for InMemoryCounterRepo {
    fn load(&self, category: Category) -> Scores {
        self.stores
            .read()
            .map(|stores| stores.get(&category).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn save(&self, category: Category, scores: &Scores) -> Result<()> {
        let mut stores = self
            .stores
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        stores.insert(category, scores.clone());
        Ok(())
    }
}
