//! Current-experiment tracker - the singleton "running now" pointer
//!
//! At most one experiment is running at a time. The pointer lives in a
//! dedicated single-slot store keyed by one well-known key, not in the
//! entity storage: `set` is an idempotent upsert, so concurrent starts
//! converge to a single record without coordination (last write wins).
//! The reference is weak - deleting the referenced experiment clears the
//! slot through the cascade coordinator.

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::Experiment;
use crate::store::Storage;

/// The one well-known slot key.
const SLOT_KEY: &str = "en_curso";

/// Singleton pointer to the experiment currently running.
#[derive(Debug, Default)]
pub struct CurrentExperimentTracker {
    slot: DashMap<&'static str, Uuid>,
}

/// Read-side view of the running experiment, joining the pointer with the
/// experiment record and its derived deadline fields.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentExperimentView {
    /// The running experiment record.
    pub experiment: Experiment,
    /// Whether the wall-clock deadline has passed (derived, see
    /// [`Experiment::already_finished`]).
    pub already_finished: bool,
    /// Seconds until the planned deadline (derived).
    pub time_remaining_secs: u32,
    /// Number of out-of-range flags recorded so far.
    pub flagged_count: usize,
}

impl CurrentExperimentTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the slot at an experiment. Idempotent; last write wins.
    pub fn set(&self, experiment_id: Uuid) {
        self.slot.insert(SLOT_KEY, experiment_id);
        tracing::debug!(experiment = %experiment_id, "current-experiment pointer set");
    }

    /// Get the currently tracked experiment id, if any.
    #[must_use]
    pub fn get(&self) -> Option<Uuid> {
        self.slot.get(SLOT_KEY).map(|e| *e.value())
    }

    /// Clear the slot unconditionally.
    pub fn clear(&self) {
        self.slot.remove(SLOT_KEY);
        tracing::debug!("current-experiment pointer cleared");
    }

    /// Clear the slot only if it currently points at `experiment_id`.
    ///
    /// Used by finish/abort/delete so that an experiment leaving the
    /// running state never clobbers a pointer that has already moved on.
    pub fn clear_if(&self, experiment_id: Uuid) {
        let removed = self
            .slot
            .remove_if(SLOT_KEY, |_, current| *current == experiment_id)
            .is_some();
        if removed {
            tracing::debug!(experiment = %experiment_id, "current-experiment pointer cleared");
        }
    }

    /// Resolve the pointer into the full read-side view.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no experiment is running, or when the slot
    /// dangles (the referenced experiment no longer exists).
    pub async fn current<S: Storage>(&self, storage: &S) -> Result<CurrentExperimentView> {
        let id = self.get().ok_or(Error::NotFound("running experiment"))?;
        let Some(experiment) = storage.experiment(id).await? else {
            tracing::warn!(experiment = %id, "current-experiment pointer dangles");
            return Err(Error::NotFound("running experiment"));
        };
        let flagged_count = storage.flags_for_experiment(id).await?.len();
        let now = Utc::now();
        Ok(CurrentExperimentView {
            already_finished: experiment.already_finished(now),
            time_remaining_secs: experiment.time_remaining_secs(now),
            flagged_count,
            experiment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_set_is_idempotent() {
        let tracker = CurrentExperimentTracker::new();
        let id = Uuid::new_v4();
        tracker.set(id);
        tracker.set(id);
        assert_eq!(tracker.get(), Some(id));
        assert_eq!(tracker.slot.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let tracker = CurrentExperimentTracker::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        tracker.set(a);
        tracker.set(b);
        assert_eq!(tracker.get(), Some(b));
    }

    #[test]
    fn test_clear_if_respects_owner() {
        let tracker = CurrentExperimentTracker::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        tracker.set(a);

        // A stale clear from another experiment must not clobber the slot.
        tracker.clear_if(b);
        assert_eq!(tracker.get(), Some(a));

        tracker.clear_if(a);
        assert_eq!(tracker.get(), None);
    }

    #[tokio::test]
    async fn test_current_view_empty_slot() {
        let tracker = CurrentExperimentTracker::new();
        let storage = MemoryStore::new();
        assert!(matches!(
            tracker.current(&storage).await,
            Err(Error::NotFound("running experiment"))
        ));
    }

    #[tokio::test]
    async fn test_current_view_dangling_pointer() {
        let tracker = CurrentExperimentTracker::new();
        let storage = MemoryStore::new();
        tracker.set(Uuid::new_v4());
        assert!(matches!(
            tracker.current(&storage).await,
            Err(Error::NotFound("running experiment"))
        ));
    }

    #[tokio::test]
    async fn test_current_view_joins_experiment() {
        let tracker = CurrentExperimentTracker::new();
        let storage = MemoryStore::new();
        let mut exp = Experiment::new("run", 600);
        exp.start(Utc::now()).unwrap();
        let id = exp.id();
        storage.insert_experiment(exp).await.unwrap();
        tracker.set(id);

        let view = tracker.current(&storage).await.unwrap();
        assert_eq!(view.experiment.id(), id);
        assert!(!view.already_finished);
        assert!(view.time_remaining_secs > 0);
        assert_eq!(view.flagged_count, 0);
    }
}
