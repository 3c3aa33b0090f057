//! Tracker store backed by a single JSON file.
//!
//! The file holds a JSON array of trackers ordered by quest id. Every
//! mutation is applied to a copy of the map, written to a sibling temp file
//! and renamed over the original; the in-memory map is only replaced once
//! the rename succeeds. A failed write therefore leaves both the file and
//! the store exactly as they were.
//!
//! The temp file is synced before the rename, so a committed mutation
//! survives a crash of the process. Writers are serialized behind one lock
//! and each mutation rewrites the whole file. Keep the tracker count modest
//! or use another backend.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{TrackerMap, TrackerStore};
use crate::error::StoreError;
use crate::quest::QuestId;
use crate::tracker::{DamageEvent, DamageTracker};

/// Tracker store persisted as one JSON document.
#[derive(Debug)]
pub struct JsonFileTrackerStore {
    path: PathBuf,
    trackers: Mutex<TrackerMap>,
}

impl JsonFileTrackerStore {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let trackers = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Vec<DamageTracker>>(&bytes)?
                .into_iter()
                .collect(),
            Err(err) if err.kind() == ErrorKind::NotFound => TrackerMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), trackers = trackers.len(), "Opened tracker store");
        Ok(Self {
            path,
            trackers: Mutex::new(trackers),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, TrackerMap>, StoreError> {
        self.trackers.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Applies `mutate` to a copy, persists it, then commits it.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut TrackerMap) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let out = mutate(&mut next)?;
        if next != *guard {
            self.flush(&next)?;
            *guard = next;
        }
        Ok(out)
    }

    fn flush(&self, trackers: &TrackerMap) -> Result<(), StoreError> {
        let records: Vec<&DamageTracker> = trackers.iter().collect();
        let bytes = serde_json::to_vec_pretty(&records)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TrackerStore for JsonFileTrackerStore {
    fn fetch(&self, quest_id: &QuestId) -> Result<Option<DamageTracker>, StoreError> {
        Ok(self.lock()?.get(quest_id).cloned())
    }

    fn create_or_update(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
    ) -> Result<DamageTracker, StoreError> {
        self.commit(|map| Ok(map.upsert(quest_id, watermark, total_damage)))
    }

    fn append_event(&self, quest_id: &QuestId, event: DamageEvent) -> Result<(), StoreError> {
        self.commit(|map| map.append(quest_id, event))
    }

    fn record(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
        event: Option<DamageEvent>,
    ) -> Result<DamageTracker, StoreError> {
        self.commit(|map| Ok(map.record(quest_id, watermark, total_damage, event)))
    }

    fn deactivate(&self, quest_id: &QuestId) -> Result<(), StoreError> {
        self.commit(|map| {
            map.deactivate(quest_id);
            Ok(())
        })
    }

    fn list(&self) -> Result<Vec<DamageTracker>, StoreError> {
        Ok(self.lock()?.iter().cloned().collect())
    }

    fn remove_where(
        &self,
        predicate: &dyn Fn(&DamageTracker) -> bool,
    ) -> Result<usize, StoreError> {
        self.commit(|map| Ok(map.remove_where(predicate)))
    }
}
