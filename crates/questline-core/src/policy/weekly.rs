//! Weekly policy: a flat charge while overdue.

use chrono::{DateTime, Utc};

use super::{flat_charge, DamageAssessment, DamagePolicy};
use crate::quest::{QuestSnapshot, Recurrence};

/// Charges `flat` once per overdue assessment, however many days have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyPolicy {
    flat: u32,
}

impl WeeklyPolicy {
    /// Creates a weekly policy charging `flat` per overdue assessment.
    #[must_use]
    pub const fn new(flat: u32) -> Self {
        Self { flat }
    }
}

impl DamagePolicy for WeeklyPolicy {
    fn recurrence(&self) -> Recurrence {
        Recurrence::Weekly
    }

    fn assess(
        &self,
        quest: &QuestSnapshot,
        watermark: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DamageAssessment {
        flat_charge("weekly", self.flat, quest, watermark, now)
    }
}
