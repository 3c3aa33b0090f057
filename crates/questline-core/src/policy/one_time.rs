//! One-time policy: a flat charge per overdue pass until the quest is done.

use chrono::{DateTime, Utc};

use super::{flat_charge, DamageAssessment, DamagePolicy};
use crate::quest::{QuestSnapshot, Recurrence};

/// Charges `flat` for each overdue assessment on a new calendar day.
///
/// Repeated passes across unresolved overdue days accumulate one charge per
/// pass, never one per elapsed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneTimePolicy {
    flat: u32,
}

impl OneTimePolicy {
    /// Creates a one-time policy charging `flat` per overdue pass.
    #[must_use]
    pub const fn new(flat: u32) -> Self {
        Self { flat }
    }
}

impl DamagePolicy for OneTimePolicy {
    fn recurrence(&self) -> Recurrence {
        Recurrence::OneTime
    }

    fn assess(
        &self,
        quest: &QuestSnapshot,
        watermark: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DamageAssessment {
        flat_charge("one-time", self.flat, quest, watermark, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::friday_noon;
    use chrono::Duration;

    const FLAT: u32 = 20;

    #[test]
    fn completed_five_days_overdue_is_free() {
        let now = friday_noon();
        let due = now - Duration::days(5);
        let quest = QuestSnapshot::new("q", due, Recurrence::OneTime).completed();
        assert_eq!(OneTimePolicy::new(FLAT).assess(&quest, due, now).damage, 0);
    }

    #[test]
    fn each_daily_pass_charges_once() {
        let now = friday_noon();
        let due = now - Duration::days(5);
        let quest = QuestSnapshot::new("q", due, Recurrence::OneTime);
        let policy = OneTimePolicy::new(FLAT);

        let mut watermark = due;
        let mut total = 0;
        for day in 0..3 {
            let a = policy.assess(&quest, watermark, now + Duration::days(day));
            total += a.damage;
            watermark = a.watermark;
        }
        assert_eq!(total, 3 * FLAT);
    }

    #[test]
    fn long_gap_still_charges_once() {
        let now = friday_noon();
        let due = now - Duration::days(30);
        let quest = QuestSnapshot::new("q", due, Recurrence::OneTime);
        let a = OneTimePolicy::new(FLAT).assess(&quest, due + Duration::days(1), now);
        assert_eq!(a.damage, FLAT);
        assert_eq!(a.missed, 1);
    }
}
