//! Damage policies, one per recurrence kind.
//!
//! A policy turns `(snapshot, watermark, now)` into a [`DamageAssessment`]:
//! how much damage the quest earned since the watermark, where the
//! watermark moves to, and a human-readable reason for the audit log.
//!
//! # Contract
//!
//! Policies are pure:
//! - No I/O, no clock reads, no shared state
//! - Never fail: malformed input degrades to zero damage
//! - The returned watermark is never earlier than the one passed in
//!
//! # Calendar arithmetic
//!
//! All day arithmetic is done on UTC calendar days. A day counts as
//! "elapsed" between a watermark `W` and `now` when the day ended inside
//! `(W, now]`, i.e. `date(W) <= day < date(now)`. A day is therefore charged
//! at most once, on the first assessment after midnight.
//!
//! # Dispatch
//!
//! [`PolicySet`] holds one policy per [`Recurrence`] and dispatches on the
//! snapshot's kind.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use questline_core::config::DamageConfig;
//! use questline_core::policy::PolicySet;
//! use questline_core::quest::{QuestSnapshot, Recurrence};
//!
//! let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
//! let due = now - Duration::days(3);
//! let quest = QuestSnapshot::new("meditate", due, Recurrence::Daily);
//!
//! let policies = PolicySet::from_config(&DamageConfig::default());
//! let assessment = policies.assess(&quest, due, now);
//!
//! assert_eq!(assessment.damage, 3 * DamageConfig::default().daily_per_day);
//! assert_eq!(assessment.watermark, now);
//! ```

mod daily;
mod one_time;
mod scheduled;
mod weekly;

pub use daily::DailyPolicy;
pub use one_time::OneTimePolicy;
pub use scheduled::ScheduledPolicy;
pub use weekly::WeeklyPolicy;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DamageConfig;
use crate::quest::{QuestSnapshot, Recurrence};

// =============================================================================
// Assessment
// =============================================================================

/// Result of assessing one quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageAssessment {
    /// Damage earned since the watermark.
    pub damage: u32,
    /// Number of missed periods behind `damage` (days, occurrences or 1).
    pub missed: u32,
    /// Watermark to persist. Never earlier than the input watermark.
    pub watermark: DateTime<Utc>,
    /// Audit reason.
    pub reason: String,
}

impl DamageAssessment {
    /// An assessment that charges nothing.
    #[must_use]
    pub fn none(watermark: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            damage: 0,
            missed: 0,
            watermark,
            reason: reason.into(),
        }
    }

    /// An assessment charging `penalty` for each of `missed` periods.
    #[must_use]
    pub fn charge(
        penalty: u32,
        missed: u32,
        watermark: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            damage: penalty.saturating_mul(missed),
            missed,
            watermark,
            reason: reason.into(),
        }
    }

    /// Returns true if the assessment carries damage.
    #[must_use]
    pub fn is_damaging(&self) -> bool {
        self.damage > 0
    }
}

// =============================================================================
// Policy Trait
// =============================================================================

/// Missed-period arithmetic for one recurrence kind.
///
/// Implementations must be `Send + Sync`: the orchestrator evaluates quests
/// in parallel against a shared [`PolicySet`].
pub trait DamagePolicy: Send + Sync {
    /// The recurrence kind this policy handles.
    fn recurrence(&self) -> Recurrence;

    /// Assesses the damage a quest earned in `(watermark, now]`.
    fn assess(
        &self,
        quest: &QuestSnapshot,
        watermark: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DamageAssessment;
}

/// Handles the cases every policy treats alike.
///
/// Completed quests never accrue, and an empty or inverted interval charges
/// nothing while holding the later of the two instants.
fn preflight(
    quest: &QuestSnapshot,
    watermark: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DamageAssessment> {
    let held = watermark.max(now);
    if quest.is_completed {
        return Some(DamageAssessment::none(held, "quest completed"));
    }
    if watermark >= now {
        return Some(DamageAssessment::none(held, "no time elapsed since last check"));
    }
    None
}

/// Calendar days that ended inside `(watermark, now]`, starting at `from`.
fn elapsed_days(from: NaiveDate, now: DateTime<Utc>) -> impl Iterator<Item = NaiveDate> {
    let end = now.date_naive();
    from.iter_days().take_while(move |day| *day < end)
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(day)
}

fn count(days: usize) -> u32 {
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Shared shape of the weekly and one-time policies.
///
/// Charges `penalty` once when the quest is past due and either has never
/// been assessed past its due date or a calendar day boundary passed since
/// the last assessment.
fn flat_charge(
    label: &str,
    penalty: u32,
    quest: &QuestSnapshot,
    watermark: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DamageAssessment {
    if let Some(assessment) = preflight(quest, watermark, now) {
        return assessment;
    }

    let due = quest.due_date;
    if now <= due {
        return DamageAssessment::none(now, format!("{label} quest not yet due"));
    }

    let first_overdue_check = watermark <= due;
    let crossed_midnight = watermark.date_naive() < now.date_naive();
    if first_overdue_check || crossed_midnight {
        DamageAssessment::charge(
            penalty,
            1,
            now,
            format!("{label} quest overdue since {}", due.format("%Y-%m-%d %H:%M")),
        )
    } else {
        DamageAssessment::none(now, format!("{label} quest already charged today"))
    }
}

// =============================================================================
// Policy Set
// =============================================================================

/// One policy per recurrence kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySet {
    daily: DailyPolicy,
    weekly: WeeklyPolicy,
    one_time: OneTimePolicy,
    scheduled: ScheduledPolicy,
}

impl PolicySet {
    /// Builds the policy set from penalty constants.
    #[must_use]
    pub fn from_config(config: &DamageConfig) -> Self {
        Self {
            daily: DailyPolicy::new(config.daily_per_day),
            weekly: WeeklyPolicy::new(config.weekly_flat),
            one_time: OneTimePolicy::new(config.one_time_flat),
            scheduled: ScheduledPolicy::new(config.scheduled_per_occurrence),
        }
    }

    /// Returns the policy for a recurrence kind.
    #[must_use]
    pub fn policy_for(&self, recurrence: Recurrence) -> &dyn DamagePolicy {
        match recurrence {
            Recurrence::Daily => &self.daily,
            Recurrence::Weekly => &self.weekly,
            Recurrence::OneTime => &self.one_time,
            Recurrence::Scheduled => &self.scheduled,
        }
    }

    /// Assesses a quest with the policy matching its recurrence kind.
    #[must_use]
    pub fn assess(
        &self,
        quest: &QuestSnapshot,
        watermark: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DamageAssessment {
        self.policy_for(quest.recurrence)
            .assess(quest, watermark, now)
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::from_config(&DamageConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
