//! Damage orchestration: one pass over every trackable quest.
//!
//! A pass runs in four phases:
//!
//! 1. **GUARD**: claim the in-flight flag; a concurrent caller is rejected
//! 2. **FETCH**: list active, incomplete quests and read "now" once
//! 3. **EVALUATE**: per quest in parallel, load the tracker, assess it with
//!    the matching policy and persist the new watermark, total and event
//! 4. **APPLY**: sum the contributions, clamp to the session cap, mutate
//!    health once and publish session state
//!
//! Per-quest failures do not abort the pass. The failing quest's damage is
//! left out of the session total and the error is kept in the report.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{Duration, TimeZone, Utc};
//! use questline_core::clock::FixedClock;
//! use questline_core::config::DamageConfig;
//! use questline_core::health::PlayerHealth;
//! use questline_core::orchestrator::DamageOrchestrator;
//! use questline_core::provider::InMemoryQuestProvider;
//! use questline_core::quest::{QuestSnapshot, Recurrence};
//! use questline_core::store::InMemoryTrackerStore;
//!
//! let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
//! let provider = Arc::new(InMemoryQuestProvider::with_quests([QuestSnapshot::new(
//!     "stretch",
//!     now - Duration::days(3),
//!     Recurrence::Daily,
//! )]));
//! let health = Arc::new(PlayerHealth::new(100));
//!
//! let orchestrator = DamageOrchestrator::new(
//!     DamageConfig::default(),
//!     provider,
//!     Arc::new(InMemoryTrackerStore::new()),
//!     health.clone(),
//! )?
//! .with_clock(Arc::new(FixedClock::new(now)));
//!
//! let report = orchestrator.calculate_and_apply_damage()?;
//! assert_eq!(report.total_damage, 15);
//! assert_eq!(health.current()?, 85);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, DamageConfig};
use crate::error::DamageError;
use crate::health::HealthPool;
use crate::policy::PolicySet;
use crate::provider::QuestProvider;
use crate::quest::{QuestId, QuestSnapshot};
use crate::session::{SessionSnapshot, SessionState};
use crate::store::TrackerStore;
use crate::tracker::{DamageEvent, DamageTracker};

// =============================================================================
// Report
// =============================================================================

/// Damage one quest contributed to a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDamage {
    /// The quest.
    pub quest_id: QuestId,
    /// Damage recorded for it.
    pub damage: u32,
    /// Why the damage was charged.
    pub reason: String,
}

/// A quest whose evaluation failed.
#[derive(Debug)]
pub struct QuestFailure {
    /// The quest.
    pub quest_id: QuestId,
    /// What went wrong.
    pub error: DamageError,
}

/// Outcome of one orchestration pass.
///
/// An error being present does not mean no damage was applied: quests that
/// persisted cleanly still count toward the total.
#[derive(Debug)]
pub struct DamageReport {
    /// The instant every quest was assessed against.
    pub evaluated_at: DateTime<Utc>,
    /// Quests fetched from the provider.
    pub quests_evaluated: usize,
    /// Positive contributions, in provider order.
    pub contributions: Vec<QuestDamage>,
    /// Sum of contributions before the session cap.
    pub uncapped_damage: u32,
    /// Damage after the session cap.
    pub total_damage: u32,
    /// Whether `total_damage` reached the health pool.
    pub applied: bool,
    /// Per-quest failures, in provider order.
    pub failures: Vec<QuestFailure>,
    /// Failure of the single health mutation, if any.
    pub health_error: Option<DamageError>,
}

impl DamageReport {
    fn empty(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            evaluated_at,
            quests_evaluated: 0,
            contributions: Vec::new(),
            uncapped_damage: 0,
            total_damage: 0,
            applied: false,
            failures: Vec::new(),
            health_error: None,
        }
    }

    /// The first per-quest failure, else the health failure.
    #[must_use]
    pub fn first_error(&self) -> Option<&DamageError> {
        self.failures
            .first()
            .map(|failure| &failure.error)
            .or(self.health_error.as_ref())
    }

    /// Damage that actually reached the health pool.
    #[must_use]
    pub fn applied_damage(&self) -> u32 {
        if self.applied {
            self.total_damage
        } else {
            0
        }
    }

    /// Returns true if the cap cut the session total.
    #[must_use]
    pub fn was_capped(&self) -> bool {
        self.uncapped_damage > self.total_damage
    }
}

impl fmt::Display for DamageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} quest(s) evaluated, {} damage",
            self.quests_evaluated, self.total_damage
        )?;
        if self.was_capped() {
            write!(f, " (capped from {})", self.uncapped_damage)?;
        }
        if !self.applied && self.total_damage > 0 {
            write!(f, ", not applied")?;
        }
        if !self.failures.is_empty() {
            write!(f, ", {} failure(s)", self.failures.len())?;
        }
        Ok(())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Coordinates policies, tracker persistence and the health pool.
pub struct DamageOrchestrator {
    config: DamageConfig,
    policies: PolicySet,
    provider: Arc<dyn QuestProvider>,
    store: Arc<dyn TrackerStore>,
    health: Arc<dyn HealthPool>,
    clock: Arc<dyn Clock>,
    session: SessionState,
}

impl fmt::Debug for DamageOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DamageOrchestrator")
            .field("config", &self.config)
            .field("session", &self.session.snapshot())
            .finish_non_exhaustive()
    }
}

impl DamageOrchestrator {
    /// Creates an orchestrator on the system clock.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] if `config` fails validation.
    pub fn new(
        config: DamageConfig,
        provider: Arc<dyn QuestProvider>,
        store: Arc<dyn TrackerStore>,
        health: Arc<dyn HealthPool>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            policies: PolicySet::from_config(&config),
            config,
            provider,
            store,
            health,
            clock: Arc::new(SystemClock),
            session: SessionState::new(),
        })
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DamageConfig {
        &self.config
    }

    /// Current published session state.
    #[must_use]
    pub fn session(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Receives every session update from now on.
    pub fn subscribe(&self) -> Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    // -------------------------------------------------------------------------
    // Passes
    // -------------------------------------------------------------------------

    /// Runs one pass over every active, incomplete quest.
    ///
    /// # Errors
    ///
    /// Returns [`DamageError::CalculationInProgress`] if another calculation
    /// holds the guard, or the provider error if quests cannot be listed.
    /// In both cases nothing is persisted and no damage is applied.
    /// Per-quest and health failures are reported in the [`DamageReport`].
    pub fn calculate_and_apply_damage(&self) -> Result<DamageReport, DamageError> {
        let Some(_guard) = self.session.try_begin() else {
            warn!("Damage pass rejected: calculation already in progress");
            return Err(DamageError::CalculationInProgress);
        };

        let now = self.clock.now();
        let quests = self.provider.fetch_active_incomplete().map_err(|err| {
            warn!(error = %err, "Damage pass aborted: quest provider failed");
            DamageError::from(err)
        })?;
        debug!(quests = quests.len(), %now, "Damage pass started");

        // Fan out per quest; collect keeps provider order
        let outcomes: Vec<_> = quests
            .par_iter()
            .map(|quest| (quest.id.clone(), self.evaluate(quest, now)))
            .collect();

        Ok(self.settle(now, quests.len(), outcomes))
    }

    /// Assesses and persists one quest without touching health.
    ///
    /// Returns the damage recorded for it. Inactive trackers and untrackable
    /// quests yield zero.
    ///
    /// # Errors
    ///
    /// Returns [`DamageError::CalculationInProgress`] while a pass runs, or
    /// the store error if the tracker could not be read or written.
    pub fn calculate_damage_for_quest(&self, quest: &QuestSnapshot) -> Result<u32, DamageError> {
        let Some(_guard) = self.session.try_begin() else {
            return Err(DamageError::CalculationInProgress);
        };
        let now = self.clock.now();
        Ok(self.evaluate(quest, now)?.map_or(0, |hit| hit.damage))
    }

    /// Charges one quest immediately, capped and applied like a pass.
    ///
    /// A quest the provider no longer has, or that is no longer trackable,
    /// yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`DamageError::CalculationInProgress`] if another calculation
    /// holds the guard, or the provider error if the quest cannot be read.
    pub fn handle_quest_failed(&self, quest_id: &QuestId) -> Result<DamageReport, DamageError> {
        let Some(_guard) = self.session.try_begin() else {
            warn!(quest = %quest_id, "Quest failure ignored: calculation already in progress");
            return Err(DamageError::CalculationInProgress);
        };

        let now = self.clock.now();
        let quest = match self.provider.fetch_quest(quest_id)? {
            Some(quest) if quest.is_trackable() => quest,
            _ => {
                debug!(quest = %quest_id, "Failed quest is gone or finished; nothing to charge");
                return Ok(DamageReport::empty(now));
            }
        };

        let outcome = self.evaluate(&quest, now);
        Ok(self.settle(now, 1, vec![(quest.id, outcome)]))
    }

    /// Stops tracking a quest that was just completed.
    ///
    /// # Errors
    ///
    /// Returns the store error if the tracker could not be deactivated.
    pub fn handle_quest_completed(&self, quest_id: &QuestId) -> Result<(), DamageError> {
        info!(quest = %quest_id, "Quest completed; tracking stopped");
        self.deactivate_tracking(quest_id)
    }

    // -------------------------------------------------------------------------
    // Queries and maintenance
    // -------------------------------------------------------------------------

    /// Damage events recorded for a quest, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if trackers cannot be read.
    pub fn damage_history(&self, quest_id: &QuestId) -> Result<Vec<DamageEvent>, DamageError> {
        Ok(self
            .store
            .fetch(quest_id)?
            .map(|tracker| tracker.history)
            .unwrap_or_default())
    }

    /// Total damage ever recorded for a quest.
    ///
    /// # Errors
    ///
    /// Returns the store error if trackers cannot be read.
    pub fn total_damage(&self, quest_id: &QuestId) -> Result<u32, DamageError> {
        Ok(self
            .store
            .fetch(quest_id)?
            .map_or(0, |tracker| tracker.total_damage))
    }

    /// Deactivates a quest's tracker. Missing trackers are ignored.
    ///
    /// # Errors
    ///
    /// Returns the store error if the change could not be persisted.
    pub fn deactivate_tracking(&self, quest_id: &QuestId) -> Result<(), DamageError> {
        self.store.deactivate(quest_id)?;
        Ok(())
    }

    /// Removes trackers that will never be evaluated again.
    ///
    /// That is every inactive tracker, plus every tracker whose quest is
    /// missing, completed or inactive at the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider or store error that stopped the sweep.
    pub fn cleanup_finished_quests(&self) -> Result<usize, DamageError> {
        let mut finished = BTreeSet::new();
        for tracker in self.store.list()? {
            if !tracker.is_active {
                finished.insert(tracker.quest_id);
                continue;
            }
            let trackable = self
                .provider
                .fetch_quest(&tracker.quest_id)?
                .is_some_and(|quest| quest.is_trackable());
            if !trackable {
                finished.insert(tracker.quest_id);
            }
        }

        if finished.is_empty() {
            return Ok(0);
        }
        let removed = self
            .store
            .remove_where(&|tracker: &DamageTracker| finished.contains(&tracker.quest_id))?;
        info!(removed, "Removed finished quest trackers");
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Assesses one quest and persists the outcome.
    ///
    /// The watermark is written on every call. The event is only appended
    /// when damage is positive.
    fn evaluate(
        &self,
        quest: &QuestSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<QuestDamage>, DamageError> {
        let tracker = self.store.fetch(&quest.id)?;
        if tracker.as_ref().is_some_and(|t| !t.is_active) {
            debug!(quest = %quest.id, "Skipping inactive tracker");
            return Ok(None);
        }

        let (watermark, total) = tracker.as_ref().map_or((quest.due_date, 0), |t| {
            (t.watermark, t.total_damage)
        });
        let assessment = self.policies.assess(quest, watermark, now);
        let next_watermark = watermark.max(assessment.watermark);

        // Watermark, total and event land together or not at all
        let event = assessment
            .is_damaging()
            .then(|| DamageEvent::new(now, assessment.damage, assessment.reason.clone()));
        self.store.record(
            &quest.id,
            next_watermark,
            total.saturating_add(assessment.damage),
            event,
        )?;

        if !assessment.is_damaging() {
            debug!(quest = %quest.id, reason = %assessment.reason, "No damage");
            return Ok(None);
        }

        debug!(
            quest = %quest.id,
            recurrence = %quest.recurrence,
            damage = assessment.damage,
            missed = assessment.missed,
            reason = %assessment.reason,
            "Damage recorded"
        );

        Ok(Some(QuestDamage {
            quest_id: quest.id.clone(),
            damage: assessment.damage,
            reason: assessment.reason,
        }))
    }

    /// Folds per-quest outcomes, applies the capped total and publishes.
    fn settle(
        &self,
        now: DateTime<Utc>,
        quests_evaluated: usize,
        outcomes: Vec<(QuestId, Result<Option<QuestDamage>, DamageError>)>,
    ) -> DamageReport {
        let mut report = DamageReport::empty(now);
        report.quests_evaluated = quests_evaluated;

        for (quest_id, outcome) in outcomes {
            match outcome {
                Ok(Some(hit)) => {
                    report.uncapped_damage = report.uncapped_damage.saturating_add(hit.damage);
                    report.contributions.push(hit);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(quest = %quest_id, error = %error, "Quest evaluation failed");
                    report.failures.push(QuestFailure { quest_id, error });
                }
            }
        }

        report.total_damage = report
            .uncapped_damage
            .min(self.config.max_damage_per_session);

        if report.total_damage > 0 {
            match self.health.apply_damage(report.total_damage) {
                Ok(()) => report.applied = true,
                Err(err) => {
                    warn!(damage = report.total_damage, error = %err, "Health mutation failed");
                    report.health_error = Some(err.into());
                }
            }
        }

        self.session
            .record_calculation(now, report.applied_damage());
        info!(
            quests = report.quests_evaluated,
            damage = report.total_damage,
            uncapped = report.uncapped_damage,
            failures = report.failures.len(),
            applied = report.applied,
            "Damage pass finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::health::PlayerHealth;
    use crate::policy::test_support::friday_noon;
    use crate::provider::InMemoryQuestProvider;
    use crate::quest::Recurrence;
    use crate::store::InMemoryTrackerStore;
    use chrono::Duration;

    fn orchestrator(quests: Vec<QuestSnapshot>) -> (DamageOrchestrator, Arc<PlayerHealth>) {
        let health = Arc::new(PlayerHealth::new(100));
        let orchestrator = DamageOrchestrator::new(
            DamageConfig::default(),
            Arc::new(InMemoryQuestProvider::with_quests(quests)),
            Arc::new(InMemoryTrackerStore::new()),
            health.clone(),
        )
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(friday_noon())));
        (orchestrator, health)
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn zero_session_cap_is_rejected() {
            let config = DamageConfig {
                max_damage_per_session: 0,
                ..DamageConfig::default()
            };
            let err = DamageOrchestrator::new(
                config,
                Arc::new(InMemoryQuestProvider::new()),
                Arc::new(InMemoryTrackerStore::new()),
                Arc::new(PlayerHealth::new(100)),
            )
            .unwrap_err();
            assert_eq!(err, ConfigError::NotPositive("max_damage_per_session"));
        }

        #[test]
        fn valid_config_is_kept() {
            let (orchestrator, _) = orchestrator(Vec::new());
            assert_eq!(*orchestrator.config(), DamageConfig::default());
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn first_error_prefers_quest_failures() {
            let mut report = DamageReport::empty(friday_noon());
            report.health_error = Some(DamageError::CalculationInProgress);
            assert!(matches!(
                report.first_error(),
                Some(DamageError::CalculationInProgress)
            ));

            report.failures.push(QuestFailure {
                quest_id: QuestId::new("q"),
                error: crate::error::StoreError::Poisoned.into(),
            });
            assert!(matches!(report.first_error(), Some(DamageError::Store(_))));
        }

        #[test]
        fn display_mentions_cap() {
            let mut report = DamageReport::empty(friday_noon());
            report.quests_evaluated = 4;
            report.uncapped_damage = 80;
            report.total_damage = 50;
            report.applied = true;
            assert_eq!(
                report.to_string(),
                "4 quest(s) evaluated, 50 damage (capped from 80)"
            );
        }
    }

    mod single_quest_tests {
        use super::*;

        #[test]
        fn second_call_is_idempotent() {
            let quest =
                QuestSnapshot::new("q", friday_noon() - Duration::days(2), Recurrence::Daily);
            let (orchestrator, health) = orchestrator(vec![quest.clone()]);

            assert_eq!(orchestrator.calculate_damage_for_quest(&quest).unwrap(), 10);
            assert_eq!(orchestrator.calculate_damage_for_quest(&quest).unwrap(), 0);
            assert_eq!(orchestrator.total_damage(&quest.id).unwrap(), 10);
            // single-quest calculation never touches health
            assert_eq!(health.current().unwrap(), 100);
        }

        #[test]
        fn deactivated_quest_is_not_charged() {
            let quest =
                QuestSnapshot::new("q", friday_noon() - Duration::days(2), Recurrence::Daily);
            let (orchestrator, _) = orchestrator(vec![quest.clone()]);

            orchestrator.calculate_damage_for_quest(&quest).unwrap();
            orchestrator.handle_quest_completed(&quest.id).unwrap();
            assert_eq!(orchestrator.calculate_damage_for_quest(&quest).unwrap(), 0);
        }

        #[test]
        fn unknown_quest_queries_are_empty() {
            let (orchestrator, _) = orchestrator(Vec::new());
            let id = QuestId::new("ghost");
            assert!(orchestrator.damage_history(&id).unwrap().is_empty());
            assert_eq!(orchestrator.total_damage(&id).unwrap(), 0);
            assert!(orchestrator.deactivate_tracking(&id).is_ok());
        }
    }
}
