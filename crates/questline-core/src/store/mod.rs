//! Tracker persistence.
//!
//! [`TrackerStore`] is the seam between the orchestrator and wherever
//! trackers live. Two backends ship with the crate:
//!
//! - [`InMemoryTrackerStore`]: process-local, for tests and embedding
//! - [`JsonFileTrackerStore`]: one JSON document, rewritten atomically on
//!   every mutation
//!
//! Both share the upsert/append/deactivate rules in [`TrackerMap`], so they
//! only differ in how (and whether) a mutation is made durable.
//!
//! # Rules
//!
//! - `create_or_update` never clobbers history and never moves the
//!   watermark or total backwards
//! - `append_event` fails with [`StoreError::TrackerNotFound`] if the tracker
//!   was never created
//! - `record` applies the upsert and the optional event as one mutation:
//!   either both are persisted or neither is
//! - `deactivate` is idempotent; a missing tracker is not an error

mod json;
mod memory;

pub use json::JsonFileTrackerStore;
pub use memory::InMemoryTrackerStore;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::quest::QuestId;
use crate::tracker::{DamageEvent, DamageTracker};

/// Persistence for damage trackers, keyed by quest.
///
/// A mutation that returns `Ok` has been handed to the backend in full; how
/// far it survives a crash depends on the backend (see
/// [`JsonFileTrackerStore`]).
pub trait TrackerStore: Send + Sync {
    /// Returns the tracker for a quest, or `None` if the quest was never tracked.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn fetch(&self, quest_id: &QuestId) -> Result<Option<DamageTracker>, StoreError>;

    /// Creates the tracker or moves an existing one forward.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation could not be persisted.
    fn create_or_update(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
    ) -> Result<DamageTracker, StoreError>;

    /// Appends one event to an existing tracker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TrackerNotFound`] if no tracker exists.
    fn append_event(&self, quest_id: &QuestId, event: DamageEvent) -> Result<(), StoreError>;

    /// Moves a tracker forward and appends `event` in one atomic step.
    ///
    /// If this returns an error the tracker is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation could not be persisted.
    fn record(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
        event: Option<DamageEvent>,
    ) -> Result<DamageTracker, StoreError>;

    /// Stops the tracker from being evaluated.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation could not be persisted.
    fn deactivate(&self, quest_id: &QuestId) -> Result<(), StoreError>;

    /// Returns every tracker, ordered by quest id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn list(&self) -> Result<Vec<DamageTracker>, StoreError>;

    /// Removes every tracker matching `predicate` and returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation could not be persisted.
    fn remove_where(
        &self,
        predicate: &dyn Fn(&DamageTracker) -> bool,
    ) -> Result<usize, StoreError>;

    /// Removes every inactive tracker.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation could not be persisted.
    fn clear_inactive(&self) -> Result<usize, StoreError> {
        self.remove_where(&|tracker| !tracker.is_active)
    }
}

/// Tracker map with the mutation rules shared by all backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerMap {
    trackers: BTreeMap<QuestId, DamageTracker>,
}

impl TrackerMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tracker for a quest.
    #[must_use]
    pub fn get(&self, quest_id: &QuestId) -> Option<&DamageTracker> {
        self.trackers.get(quest_id)
    }

    /// Number of trackers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// Returns true if there are no trackers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Iterates trackers in quest id order.
    pub fn iter(&self) -> impl Iterator<Item = &DamageTracker> {
        self.trackers.values()
    }

    /// Creates or moves a tracker forward. History and `is_active` are kept.
    pub fn upsert(
        &mut self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
    ) -> DamageTracker {
        self.advance(quest_id, watermark, total_damage).clone()
    }

    fn advance(
        &mut self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
    ) -> &mut DamageTracker {
        let tracker = self
            .trackers
            .entry(quest_id.clone())
            .or_insert_with(|| DamageTracker::new(quest_id.clone(), watermark));
        tracker.watermark = tracker.watermark.max(watermark);
        tracker.total_damage = tracker.total_damage.max(total_damage);
        tracker
    }

    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TrackerNotFound`] if the tracker does not exist.
    pub fn append(&mut self, quest_id: &QuestId, event: DamageEvent) -> Result<(), StoreError> {
        let tracker = self
            .trackers
            .get_mut(quest_id)
            .ok_or_else(|| StoreError::TrackerNotFound(quest_id.clone()))?;
        tracker.push_event(event);
        Ok(())
    }

    /// Upserts the tracker and appends `event` to it.
    pub fn record(
        &mut self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
        event: Option<DamageEvent>,
    ) -> DamageTracker {
        let tracker = self.advance(quest_id, watermark, total_damage);
        if let Some(event) = event {
            tracker.push_event(event);
        }
        tracker.clone()
    }

    /// Marks a tracker inactive. Returns true if anything changed.
    pub fn deactivate(&mut self, quest_id: &QuestId) -> bool {
        match self.trackers.get_mut(quest_id) {
            Some(tracker) if tracker.is_active => {
                tracker.is_active = false;
                true
            }
            _ => false,
        }
    }

    /// Removes matching trackers and returns how many went.
    pub fn remove_where(&mut self, predicate: &dyn Fn(&DamageTracker) -> bool) -> usize {
        let before = self.trackers.len();
        self.trackers.retain(|_, tracker| !predicate(tracker));
        before - self.trackers.len()
    }
}

impl FromIterator<DamageTracker> for TrackerMap {
    fn from_iter<I: IntoIterator<Item = DamageTracker>>(iter: I) -> Self {
        Self {
            trackers: iter
                .into_iter()
                .map(|tracker| (tracker.quest_id.clone(), tracker))
                .collect(),
        }
    }
}
