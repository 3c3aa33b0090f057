//! Quest provider port.
//!
//! The quest CRUD layer lives outside this crate. The orchestrator only
//! needs to list trackable quests and look one up by id.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ProviderError;
use crate::quest::{QuestId, QuestSnapshot};

/// Source of quest snapshots.
pub trait QuestProvider: Send + Sync {
    /// Returns every quest that is active and not completed.
    ///
    /// # Errors
    ///
    /// Returns an error if quests cannot be listed.
    fn fetch_active_incomplete(&self) -> Result<Vec<QuestSnapshot>, ProviderError>;

    /// Looks up one quest.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be read.
    fn fetch_quest(&self, quest_id: &QuestId) -> Result<Option<QuestSnapshot>, ProviderError>;
}

/// Quest provider backed by an in-memory map.
///
/// Quests are returned in id order.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use questline_core::provider::{InMemoryQuestProvider, QuestProvider};
/// use questline_core::quest::{QuestSnapshot, Recurrence};
///
/// let provider = InMemoryQuestProvider::new();
/// provider.upsert(QuestSnapshot::new("a", Utc::now(), Recurrence::Daily)).unwrap();
/// provider.upsert(QuestSnapshot::new("b", Utc::now(), Recurrence::Daily).completed()).unwrap();
///
/// assert_eq!(provider.fetch_active_incomplete().unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryQuestProvider {
    quests: RwLock<BTreeMap<QuestId, QuestSnapshot>>,
}

impl InMemoryQuestProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider holding `quests`.
    #[must_use]
    pub fn with_quests(quests: impl IntoIterator<Item = QuestSnapshot>) -> Self {
        Self {
            quests: RwLock::new(
                quests
                    .into_iter()
                    .map(|quest| (quest.id.clone(), quest))
                    .collect(),
            ),
        }
    }

    /// Inserts or replaces a quest.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Poisoned`] if the lock is poisoned.
    pub fn upsert(&self, quest: QuestSnapshot) -> Result<(), ProviderError> {
        self.write()?.insert(quest.id.clone(), quest);
        Ok(())
    }

    /// Removes a quest, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Poisoned`] if the lock is poisoned.
    pub fn remove(&self, quest_id: &QuestId) -> Result<Option<QuestSnapshot>, ProviderError> {
        Ok(self.write()?.remove(quest_id))
    }

    /// Returns every quest, trackable or not.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Poisoned`] if the lock is poisoned.
    pub fn all(&self) -> Result<Vec<QuestSnapshot>, ProviderError> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<QuestId, QuestSnapshot>>, ProviderError> {
        self.quests.read().map_err(|_| ProviderError::Poisoned)
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<QuestId, QuestSnapshot>>, ProviderError> {
        self.quests.write().map_err(|_| ProviderError::Poisoned)
    }
}

impl QuestProvider for InMemoryQuestProvider {
    fn fetch_active_incomplete(&self) -> Result<Vec<QuestSnapshot>, ProviderError> {
        Ok(self
            .read()?
            .values()
            .filter(|quest| quest.is_trackable())
            .cloned()
            .collect())
    }

    fn fetch_quest(&self, quest_id: &QuestId) -> Result<Option<QuestSnapshot>, ProviderError> {
        Ok(self.read()?.get(quest_id).cloned())
    }
}
