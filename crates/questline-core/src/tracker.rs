//! Damage trackers and their append-only event history.
//!
//! One [`DamageTracker`] exists per tracked quest. It carries:
//! - `watermark`: exclusive lower bound of the next assessment
//! - `total_damage`: cumulative damage charged to the quest
//! - `history`: append-only list of [`DamageEvent`]s
//! - `is_active`: whether orchestration passes still consider the quest
//!
//! # Invariants
//!
//! - `watermark` and `total_damage` never decrease
//! - `history` is only ever appended to
//!
//! [`DamageTracker::advance`] is the only way to move the first two, and it
//! enforces both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quest::QuestId;

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// When the damage was charged.
    pub timestamp: DateTime<Utc>,
    /// Damage charged.
    pub amount: u32,
    /// Which policy charged it and for which missed interval.
    pub reason: String,
}

impl DamageEvent {
    /// Creates a damage event.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, amount: u32, reason: impl Into<String>) -> Self {
        Self {
            timestamp,
            amount,
            reason: reason.into(),
        }
    }
}

/// Persisted damage state for one quest.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use questline_core::quest::QuestId;
/// use questline_core::tracker::DamageTracker;
///
/// let due = Utc.with_ymd_and_hms(2026, 10, 13, 9, 0, 0).unwrap();
/// let mut tracker = DamageTracker::new(QuestId::new("q"), due);
///
/// tracker.advance(due + Duration::days(3), 15);
/// tracker.advance(due + Duration::days(1), 0);
///
/// assert_eq!(tracker.watermark, due + Duration::days(3));
/// assert_eq!(tracker.total_damage, 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTracker {
    /// Quest this tracker belongs to.
    pub quest_id: QuestId,
    /// Last damage check date.
    pub watermark: DateTime<Utc>,
    /// Cumulative damage charged.
    pub total_damage: u32,
    /// Whether the tracker is still evaluated.
    pub is_active: bool,
    /// Append-only audit log.
    #[serde(default)]
    pub history: Vec<DamageEvent>,
}

impl DamageTracker {
    /// Creates an active tracker with an empty history.
    #[must_use]
    pub fn new(quest_id: QuestId, watermark: DateTime<Utc>) -> Self {
        Self {
            quest_id,
            watermark,
            total_damage: 0,
            is_active: true,
            history: Vec::new(),
        }
    }

    /// Moves the watermark forward and adds `damage` to the total.
    ///
    /// An earlier watermark is ignored. The total saturates at `u32::MAX`.
    pub fn advance(&mut self, watermark: DateTime<Utc>, damage: u32) {
        self.watermark = self.watermark.max(watermark);
        self.total_damage = self.total_damage.saturating_add(damage);
    }

    /// Appends an event to the history.
    pub fn push_event(&mut self, event: DamageEvent) {
        self.history.push(event);
    }

    /// Returns the most recent event, if any.
    #[must_use]
    pub fn last_event(&self) -> Option<&DamageEvent> {
        self.history.last()
    }
}
