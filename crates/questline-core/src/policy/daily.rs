//! Daily policy: one charge per missed calendar day.
//!
//! A completion resets the count: days up to and including the latest
//! completion inside the interval are never charged.

use chrono::{DateTime, Utc};

use super::{count, elapsed_days, next_day, preflight, DamageAssessment, DamagePolicy};
use crate::quest::{QuestSnapshot, Recurrence};

/// Charges `per_day` for each elapsed calendar day after the latest completion.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use questline_core::policy::{DailyPolicy, DamagePolicy};
/// use questline_core::quest::{QuestSnapshot, Recurrence};
///
/// let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
/// let due = now - Duration::days(4);
/// let quest = QuestSnapshot::new("journal", due, Recurrence::Daily)
///     .with_completion(now - Duration::days(2));
///
/// // Only yesterday is left uncovered by the completion.
/// let assessment = DailyPolicy::new(5).assess(&quest, due, now);
/// assert_eq!(assessment.damage, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPolicy {
    per_day: u32,
}

impl DailyPolicy {
    /// Creates a daily policy charging `per_day` per missed day.
    #[must_use]
    pub const fn new(per_day: u32) -> Self {
        Self { per_day }
    }
}

impl DamagePolicy for DailyPolicy {
    fn recurrence(&self) -> Recurrence {
        Recurrence::Daily
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

        let first = watermark.date_naive();
        let today = now.date_naive();
        let latest_completion = quest
            .completion_days()
            .filter(|day| *day >= first && *day <= today)
            .max();
        let start = latest_completion.map_or(first, |day| next_day(day).max(first));

        let missed: Vec<_> = elapsed_days(start, now).collect();
        let (Some(from), Some(through)) = (missed.first(), missed.last()) else {
            let reason = match latest_completion {
                Some(day) => format!("completed on {day}, no missed days since"),
                None => "no missed days".to_string(),
            };
            return DamageAssessment::none(now, reason);
        };

        DamageAssessment::charge(
            self.per_day,
            count(missed.len()),
            now,
            format!(
                "missed daily quest on {} day(s) from {from} through {through}",
                missed.len()
            ),
        )
    }
}
