//! Process-local tracker store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::{TrackerMap, TrackerStore};
use crate::error::StoreError;
use crate::quest::QuestId;
use crate::tracker::{DamageEvent, DamageTracker};

/// Tracker store held in memory.
///
/// Durable for the lifetime of the process only.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use questline_core::quest::QuestId;
/// use questline_core::store::{InMemoryTrackerStore, TrackerStore};
/// use questline_core::tracker::DamageEvent;
///
/// let store = InMemoryTrackerStore::new();
/// let id = QuestId::new("q");
/// store.create_or_update(&id, Utc::now(), 5).unwrap();
/// store.append_event(&id, DamageEvent::new(Utc::now(), 5, "missed")).unwrap();
///
/// assert_eq!(store.fetch(&id).unwrap().unwrap().history.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTrackerStore {
    trackers: RwLock<TrackerMap>,
}

impl InMemoryTrackerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with existing trackers.
    #[must_use]
    pub fn with_trackers(trackers: impl IntoIterator<Item = DamageTracker>) -> Self {
        Self {
            trackers: RwLock::new(trackers.into_iter().collect()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TrackerMap>, StoreError> {
        self.trackers.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TrackerMap>, StoreError> {
        self.trackers.write().map_err(|_| StoreError::Poisoned)
    }
}

impl TrackerStore for InMemoryTrackerStore {
    fn fetch(&self, quest_id: &QuestId) -> Result<Option<DamageTracker>, StoreError> {
        Ok(self.read()?.get(quest_id).cloned())
    }

    fn create_or_update(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
    ) -> Result<DamageTracker, StoreError> {
        Ok(self.write()?.upsert(quest_id, watermark, total_damage))
    }

    fn append_event(&self, quest_id: &QuestId, event: DamageEvent) -> Result<(), StoreError> {
        self.write()?.append(quest_id, event)
    }

    fn record(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
        event: Option<DamageEvent>,
    ) -> Result<DamageTracker, StoreError> {
        Ok(self.write()?.record(quest_id, watermark, total_damage, event))
    }

    fn deactivate(&self, quest_id: &QuestId) -> Result<(), StoreError> {
        self.write()?.deactivate(quest_id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<DamageTracker>, StoreError> {
        Ok(self.read()?.iter().cloned().collect())
    }

    fn remove_where(
        &self,
        predicate: &dyn Fn(&DamageTracker) -> bool,
    ) -> Result<usize, StoreError> {
        Ok(self.write()?.remove_where(predicate))
    }
}
