//! Test helpers for wiring orchestrators and injecting failures.
//!
//! Every fixture is anchored at [`now`], a Friday noon, so weekday-sensitive
//! tests read the same way everywhere.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::clock::FixedClock;
use crate::config::DamageConfig;
use crate::error::{HealthError, ProviderError, StoreError};
use crate::health::{HealthPool, PlayerHealth};
use crate::orchestrator::DamageOrchestrator;
use crate::policy::test_support::friday_noon;
use crate::provider::{InMemoryQuestProvider, QuestProvider};
use crate::quest::{QuestId, QuestSnapshot, Recurrence, Weekdays};
use crate::store::{InMemoryTrackerStore, TrackerStore};
use crate::tracker::{DamageEvent, DamageTracker};

// =============================================================================
// Quest Fixtures
// =============================================================================

/// Friday 2026-10-16, 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    friday_noon()
}

/// A daily quest due `days` days before [`now`].
pub fn daily(id: &str, days: i64) -> QuestSnapshot {
    QuestSnapshot::new(id, now() - Duration::days(days), Recurrence::Daily)
}

/// A weekly quest due `days` days before [`now`].
pub fn weekly(id: &str, days: i64) -> QuestSnapshot {
    QuestSnapshot::new(id, now() - Duration::days(days), Recurrence::Weekly)
}

/// A one-time quest due `days` days before [`now`].
pub fn one_time(id: &str, days: i64) -> QuestSnapshot {
    QuestSnapshot::new(id, now() - Duration::days(days), Recurrence::OneTime)
}

/// A Monday/Wednesday scheduled quest due `days` days before [`now`].
pub fn mon_wed(id: &str, days: i64) -> QuestSnapshot {
    QuestSnapshot::new(id, now() - Duration::days(days), Recurrence::Scheduled)
        .with_weekdays(Weekdays::MONDAY | Weekdays::WEDNESDAY)
}

// =============================================================================
// Harness
// =============================================================================

/// An orchestrator wired to in-memory collaborators the test can inspect.
pub struct Harness {
    pub orchestrator: DamageOrchestrator,
    pub provider: Arc<InMemoryQuestProvider>,
    pub store: Arc<InMemoryTrackerStore>,
    pub health: Arc<PlayerHealth>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// Default config, 100 health, clock at [`now`].
    pub fn new(quests: impl IntoIterator<Item = QuestSnapshot>) -> Self {
        Self::with_config(DamageConfig::default(), quests)
    }

    pub fn with_config(
        config: DamageConfig,
        quests: impl IntoIterator<Item = QuestSnapshot>,
    ) -> Self {
        let provider = Arc::new(InMemoryQuestProvider::with_quests(quests));
        let store = Arc::new(InMemoryTrackerStore::new());
        let health = Arc::new(PlayerHealth::new(100));
        let clock = Arc::new(FixedClock::new(now()));
        let orchestrator = DamageOrchestrator::new(
            config,
            provider.clone(),
            store.clone(),
            health.clone(),
        )
        .unwrap()
        .with_clock(clock.clone());
        Self {
            orchestrator,
            provider,
            store,
            health,
            clock,
        }
    }

    pub fn tracker(&self, id: &str) -> Option<DamageTracker> {
        self.store.fetch(&QuestId::new(id)).unwrap()
    }

    pub fn hp(&self) -> u32 {
        self.health.current().unwrap()
    }
}

/// Wires an orchestrator around arbitrary collaborators, clock at [`now`].
pub fn orchestrator_with(
    provider: Arc<dyn QuestProvider>,
    store: Arc<dyn TrackerStore>,
    health: Arc<dyn HealthPool>,
) -> DamageOrchestrator {
    DamageOrchestrator::new(DamageConfig::default(), provider, store, health)
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(now())))
}

// =============================================================================
// Failure-Injecting Doubles
// =============================================================================

/// Which store write a [`FlakyStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Any tracker write.
    Upsert,
    /// Writes that carry a damage event.
    Append,
}

/// In-memory store that fails one operation for selected quests.
pub struct FlakyStore {
    pub inner: InMemoryTrackerStore,
    failing: BTreeSet<QuestId>,
    fail_on: FailOn,
}

impl FlakyStore {
    pub fn new(fail_on: FailOn, failing: &[&str]) -> Self {
        Self {
            inner: InMemoryTrackerStore::new(),
            failing: failing.iter().map(|id| QuestId::new(*id)).collect(),
            fail_on,
        }
    }

    fn check(&self, quest_id: &QuestId, op: FailOn) -> Result<(), StoreError> {
        if op == self.fail_on && self.failing.contains(quest_id) {
            return Err(StoreError::Io(std::io::Error::other(format!(
                "injected failure for {quest_id}"
            ))));
        }
        Ok(())
    }
}

impl TrackerStore for FlakyStore {
    fn fetch(&self, quest_id: &QuestId) -> Result<Option<DamageTracker>, StoreError> {
        self.inner.fetch(quest_id)
    }

    fn create_or_update(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
    ) -> Result<DamageTracker, StoreError> {
        self.check(quest_id, FailOn::Upsert)?;
        self.inner.create_or_update(quest_id, watermark, total_damage)
    }

    fn append_event(&self, quest_id: &QuestId, event: DamageEvent) -> Result<(), StoreError> {
        self.check(quest_id, FailOn::Append)?;
        self.inner.append_event(quest_id, event)
    }

    fn record(
        &self,
        quest_id: &QuestId,
        watermark: DateTime<Utc>,
        total_damage: u32,
        event: Option<DamageEvent>,
    ) -> Result<DamageTracker, StoreError> {
        self.check(quest_id, FailOn::Upsert)?;
        if event.is_some() {
            self.check(quest_id, FailOn::Append)?;
        }
        self.inner.record(quest_id, watermark, total_damage, event)
    }

    fn deactivate(&self, quest_id: &QuestId) -> Result<(), StoreError> {
        self.inner.deactivate(quest_id)
    }

    fn list(&self) -> Result<Vec<DamageTracker>, StoreError> {
        self.inner.list()
    }

    fn remove_where(
        &self,
        predicate: &dyn Fn(&DamageTracker) -> bool,
    ) -> Result<usize, StoreError> {
        self.inner.remove_where(predicate)
    }
}

/// Provider that is always down.
pub struct DownProvider;

impl QuestProvider for DownProvider {
    fn fetch_active_incomplete(&self) -> Result<Vec<QuestSnapshot>, ProviderError> {
        Err(ProviderError::Unavailable("quest database offline".into()))
    }

    fn fetch_quest(&self, _quest_id: &QuestId) -> Result<Option<QuestSnapshot>, ProviderError> {
        Err(ProviderError::Unavailable("quest database offline".into()))
    }
}

/// Provider that parks every listing until the test releases it.
///
/// `entered` trips once the pass is inside the provider; `release` lets it
/// continue.
pub struct GatedProvider {
    pub inner: InMemoryQuestProvider,
    pub entered: Barrier,
    pub release: Barrier,
}

impl GatedProvider {
    pub fn new(quests: impl IntoIterator<Item = QuestSnapshot>) -> Self {
        Self {
            inner: InMemoryQuestProvider::with_quests(quests),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl QuestProvider for GatedProvider {
    fn fetch_active_incomplete(&self) -> Result<Vec<QuestSnapshot>, ProviderError> {
        self.entered.wait();
        self.release.wait();
        self.inner.fetch_active_incomplete()
    }

    fn fetch_quest(&self, quest_id: &QuestId) -> Result<Option<QuestSnapshot>, ProviderError> {
        self.inner.fetch_quest(quest_id)
    }
}

/// Health pool that records every mutation, optionally failing them.
#[derive(Default)]
pub struct RecordingHealth {
    pub calls: Mutex<Vec<u32>>,
    pub fail: bool,
}

impl RecordingHealth {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl HealthPool for RecordingHealth {
    fn apply_damage(&self, amount: u32) -> Result<(), HealthError> {
        self.calls.lock().unwrap().push(amount);
        if self.fail {
            return Err(HealthError::Unavailable("health service rejected write".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Files
// =============================================================================

/// A fresh path under the system temp dir, removed on drop.
pub struct TempPath(pub std::path::PathBuf);

impl TempPath {
    pub fn new(stem: &str) -> Self {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(std::env::temp_dir().join(format!("{stem}-{}-{n}.json", std::process::id())))
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
