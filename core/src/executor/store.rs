use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::resolve::ObservationLookup;
use super::types::Observation;

/// Observation map shared by every worker of a scheduling pass.
///
/// Writers bump a generation counter on a `watch` channel after each insert;
/// waiters subscribe, re-check, and sleep until the next bump. The map lock is
/// never held across an await.
#[derive(Debug)]
pub struct ObservationStore {
    entries: Mutex<BTreeMap<u32, Observation>>,
    generation: watch::Sender<u64>,
}

impl Default for ObservationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationStore {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            entries: Mutex::new(BTreeMap::new()),
            generation,
        }
    }

    /// Store pre-filled with results from an earlier pass. Seeded entries are
    /// marked `from_prior_run` and never returned as new.
    pub fn seeded(prior: impl IntoIterator<Item = Observation>) -> Self {
        let store = Self::new();
        {
            let mut entries = store.entries();
            for mut observation in prior {
                observation.from_prior_run = true;
                entries.insert(observation.task_index, observation);
            }
        }
        store
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<u32, Observation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `observation` unless its index already has one.
    ///
    /// Returns `false` when the write was ignored.
    pub fn record(&self, observation: Observation) -> bool {
        let index = observation.task_index;
        {
            let mut entries = self.entries();
            if entries.contains_key(&index) {
                tracing::warn!(
                    target: "llmc.scheduler",
                    index,
                    "observation already recorded, ignoring second write"
                );
                return false;
            }
            entries.insert(index, observation);
        }
        self.generation.send_modify(|generation| *generation += 1);
        true
    }

    /// Suspends until every index in `indices` has an observation.
    pub async fn wait_for(&self, indices: &[u32]) {
        let mut changes = self.generation.subscribe();
        loop {
            if self.has_all(indices) {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.entries().contains_key(&index)
    }

    pub fn get(&self, index: u32) -> Option<Observation> {
        self.entries().get(&index).cloned()
    }

    pub fn has_all(&self, indices: &[u32]) -> bool {
        let entries = self.entries();
        indices.iter().all(|index| entries.contains_key(index))
    }

    /// Indices from `indices` without an observation yet.
    pub fn missing(&self, indices: &[u32]) -> Vec<u32> {
        let entries = self.entries();
        indices
            .iter()
            .copied()
            .filter(|index| !entries.contains_key(index))
            .collect()
    }

    /// Values of `indices`, read under a single lock.
    ///
    /// Fails with the first index that has no observation.
    pub fn values_for(&self, indices: &[u32]) -> Result<HashMap<u32, String>, u32> {
        let entries = self.entries();
        indices
            .iter()
            .map(|index| {
                entries
                    .get(index)
                    .map(|obs| (*index, obs.value.clone()))
                    .ok_or(*index)
            })
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<u32, Observation> {
        self.entries().clone()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.entries().keys().copied().collect()
    }

    /// Observations recorded for `indices`, ordered by index.
    pub fn observations_for(&self, indices: &[u32]) -> Vec<Observation> {
        let entries = self.entries();
        let mut found: Vec<Observation> = indices
            .iter()
            .filter_map(|index| entries.get(index).cloned())
            .collect();
        found.sort_by_key(|obs| obs.task_index);
        found
    }

    /// Everything not seeded from a prior run, ordered by index.
    pub fn new_observations(&self) -> Vec<Observation> {
        self.entries()
            .values()
            .filter(|obs| !obs.from_prior_run)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl ObservationLookup for ObservationStore {
    fn observation_value(&self, index: u32) -> Option<String> {
        self.entries().get(&index).map(|obs| obs.value.clone())
    }
}
