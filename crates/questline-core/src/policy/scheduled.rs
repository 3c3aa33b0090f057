//! Scheduled policy: one charge per missed scheduled weekday.

use chrono::{DateTime, Datelike, Utc};

use super::{count, elapsed_days, preflight, DamageAssessment, DamagePolicy};
use crate::quest::{QuestSnapshot, Recurrence};

/// Charges `per_occurrence` for each elapsed scheduled weekday without a
/// completion on that day. Unscheduled days are never charged.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use questline_core::policy::{DamagePolicy, ScheduledPolicy};
/// use questline_core::quest::{QuestSnapshot, Recurrence, Weekdays};
///
/// let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
/// let due = now - Duration::days(7);
/// let quest = QuestSnapshot::new("gym", due, Recurrence::Scheduled)
///     .with_weekdays(Weekdays::MONDAY | Weekdays::WEDNESDAY);
///
/// assert_eq!(ScheduledPolicy::new(8).assess(&quest, due, now).damage, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPolicy {
    per_occurrence: u32,
}

impl ScheduledPolicy {
    /// Creates a scheduled policy charging `per_occurrence` per missed day.
    #[must_use]
    pub const fn new(per_occurrence: u32) -> Self {
        Self { per_occurrence }
    }
}

impl DamagePolicy for ScheduledPolicy {
    fn recurrence(&self) -> Recurrence {
        Recurrence::Scheduled
    }

    fn assess(
        &self,
        quest: &QuestSnapshot,
        watermark: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DamageAssessment {
        if let Some(assessment) = preflight(quest, watermark, now) {
            return assessment;
        }
        if quest.weekdays.is_empty() {
            return DamageAssessment::none(now, "no scheduled weekdays");
        }

        let missed: Vec<_> = elapsed_days(watermark.date_naive(), now)
            .filter(|day| quest.weekdays.contains_weekday(day.weekday()))
            .filter(|day| !quest.completed_on(*day))
            .collect();
        if missed.is_empty() {
            return DamageAssessment::none(now, "no missed scheduled occurrences");
        }

        let listed = missed
            .iter()
            .map(|day| day.format("%a %Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        DamageAssessment::charge(
            self.per_occurrence,
            count(missed.len()),
            now,
            format!(
                "missed {} scheduled occurrence(s): {listed}",
                missed.len()
            ),
        )
    }
}
