//! Quest snapshot model consumed by the damage engine.
//!
//! The damage engine never owns quests. It reads [`QuestSnapshot`]s handed
//! over by a [`QuestProvider`](crate::provider::QuestProvider) and derives
//! everything else (trackers, events, damage) from them.
//!
//! - [`QuestId`]: Stable identifier shared with the quest provider
//! - [`Recurrence`]: Recurrence kind used to select a damage policy
//! - [`Weekdays`]: Set of weekdays for scheduled quests
//! - [`QuestSnapshot`]: Read-only view of one quest
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use questline_core::quest::{QuestSnapshot, Recurrence, Weekdays};
//!
//! let due = Utc.with_ymd_and_hms(2026, 10, 12, 9, 0, 0).unwrap();
//! let quest = QuestSnapshot::new("stretch", due, Recurrence::Scheduled)
//!     .with_weekdays(Weekdays::MONDAY | Weekdays::WEDNESDAY);
//!
//! assert!(quest.weekdays.contains_weekday(chrono::Weekday::Wed));
//! assert!(quest.is_trackable());
//! ```

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Unique identifier for a quest.
///
/// Quest identifiers are assigned by the quest provider and are treated as
/// opaque strings. They key damage trackers one-to-one.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(String);

impl QuestId {
    /// Creates a new `QuestId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestId({})", self.0)
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QuestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Recurrence kind of a quest.
///
/// Each kind maps to exactly one damage policy.
///
/// - `Daily`: Due every calendar day
/// - `Weekly`: Due once per week, charged as a flat penalty when overdue
/// - `OneTime`: Due once, charged as a flat penalty while overdue
/// - `Scheduled`: Due on a fixed set of weekdays
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Every calendar day.
    Daily,
    /// Once per week.
    Weekly,
    /// Exactly once.
    OneTime,
    /// On the weekdays listed in [`QuestSnapshot::weekdays`].
    Scheduled,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::OneTime => write!(f, "one-time"),
            Self::Scheduled => write!(f, "scheduled"),
        }
    }
}

bitflags! {
    /// Set of weekdays on which a scheduled quest is due.
    ///
    /// Only meaningful for [`Recurrence::Scheduled`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Weekdays: u8 {
        /// Monday
        const MONDAY = 1 << 0;
        /// Tuesday
        const TUESDAY = 1 << 1;
        /// Wednesday
        const WEDNESDAY = 1 << 2;
        /// Thursday
        const THURSDAY = 1 << 3;
        /// Friday
        const FRIDAY = 1 << 4;
        /// Saturday
        const SATURDAY = 1 << 5;
        /// Sunday
        const SUNDAY = 1 << 6;
    }
}

impl Default for Weekdays {
    fn default() -> Self {
        Self::empty()
    }
}

impl Weekdays {
    /// Returns the flag for a single chrono weekday.
    #[must_use]
    pub const fn from_weekday(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::MONDAY,
            Weekday::Tue => Self::TUESDAY,
            Weekday::Wed => Self::WEDNESDAY,
            Weekday::Thu => Self::THURSDAY,
            Weekday::Fri => Self::FRIDAY,
            Weekday::Sat => Self::SATURDAY,
            Weekday::Sun => Self::SUNDAY,
        }
    }

    /// Checks whether the given weekday is in the set.
    #[must_use]
    pub fn contains_weekday(self, day: Weekday) -> bool {
        self.contains(Self::from_weekday(day))
    }
}

impl FromIterator<Weekday> for Weekdays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, day| set | Self::from_weekday(day))
    }
}

/// Read-only view of one quest, supplied by the quest provider.
///
/// The damage engine never mutates snapshots. Completion data is carried in
/// two places: the full set of `completions` and an optional `completed_at`
/// for the most recent ("primary") completion. Policies consider both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestSnapshot {
    /// Quest identifier.
    pub id: QuestId,
    /// Due date. Trackers start their watermark here.
    pub due_date: DateTime<Utc>,
    /// Recurrence kind.
    pub recurrence: Recurrence,
    /// Scheduled weekdays (scheduled quests only).
    #[serde(default)]
    pub weekdays: Weekdays,
    /// Every recorded completion.
    #[serde(default)]
    pub completions: BTreeSet<DateTime<Utc>>,
    /// Primary completion date, if any.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the quest is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Whether the quest is finished for good.
    #[serde(default)]
    pub is_completed: bool,
}

fn default_true() -> bool {
    true
}

impl QuestSnapshot {
    /// Creates an active, incomplete quest with no completions.
    #[must_use]
    pub fn new(id: impl Into<QuestId>, due_date: DateTime<Utc>, recurrence: Recurrence) -> Self {
        Self {
            id: id.into(),
            due_date,
            recurrence,
            weekdays: Weekdays::empty(),
            completions: BTreeSet::new(),
            completed_at: None,
            is_active: true,
            is_completed: false,
        }
    }

    /// Sets the scheduled weekdays.
    #[must_use]
    pub fn with_weekdays(mut self, weekdays: Weekdays) -> Self {
        self.weekdays = weekdays;
        self
    }

    /// Adds a completion date.
    #[must_use]
    pub fn with_completion(mut self, at: DateTime<Utc>) -> Self {
        self.completions.insert(at);
        self
    }

    /// Sets the primary completion date.
    #[must_use]
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Marks the quest as finished.
    #[must_use]
    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    /// Marks the quest as inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Returns true if the quest should be considered by an orchestration pass.
    #[must_use]
    pub fn is_trackable(&self) -> bool {
        self.is_active && !self.is_completed
    }

    /// Iterates over the calendar days of every completion, primary included.
    ///
    /// Days may repeat.
    pub fn completion_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.completions
            .iter()
            .chain(self.completed_at.iter())
            .map(DateTime::date_naive)
    }

    /// Returns true if a completion was recorded on the given calendar day.
    #[must_use]
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.completion_days().any(|d| d == day)
    }
}
