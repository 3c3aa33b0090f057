//! Session state published by the orchestrator.
//!
//! [`SessionState`] owns three things:
//! - the in-flight flag that admits one calculation at a time
//! - the published [`SessionSnapshot`] read by the UI layer
//! - the subscriber channels that receive every new snapshot
//!
//! # In-flight guard
//!
//! [`SessionState::try_begin`] performs an atomic compare-and-swap on the
//! flag. Losers are rejected, not queued. The winner holds a
//! [`CalculationGuard`] that clears the flag when dropped, unwinding
//! included.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Published session fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// A calculation is running.
    pub is_calculating: bool,
    /// When the last calculation finished.
    pub last_calculation: Option<DateTime<Utc>>,
    /// Damage applied since the start of the current UTC day.
    pub damage_taken_today: u32,
}

/// Session state shared between the orchestrator and its observers.
#[derive(Debug, Default)]
pub struct SessionState {
    in_flight: AtomicBool,
    snapshot: RwLock<SessionSnapshot>,
    subscribers: Mutex<Vec<Sender<SessionSnapshot>>>,
}

impl SessionState {
    /// Creates an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to snapshot updates.
    ///
    /// Dropping the receiver unsubscribes on the next publish.
    pub fn subscribe(&self) -> Receiver<SessionSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Claims the in-flight flag, or returns `None` if it is already held.
    pub fn try_begin(&self) -> Option<CalculationGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.update(|s| s.is_calculating = true);
        Some(CalculationGuard { session: self })
    }

    /// Returns true while a calculation holds the flag.
    #[must_use]
    pub fn is_calculating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Records a finished calculation that applied `applied` damage.
    ///
    /// The daily counter restarts when `at` falls on a later UTC day than
    /// the previous calculation.
    pub fn record_calculation(&self, at: DateTime<Utc>, applied: u32) {
        self.update(|s| {
            let same_day = s
                .last_calculation
                .is_some_and(|last| last.date_naive() == at.date_naive());
            if !same_day {
                s.damage_taken_today = 0;
            }
            s.damage_taken_today = s.damage_taken_today.saturating_add(applied);
            s.last_calculation = Some(s.last_calculation.map_or(at, |last| last.max(at)));
        });
    }

    fn update(&self, mutate: impl FnOnce(&mut SessionSnapshot)) {
        let published = {
            let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            mutate(&mut snapshot);
            *snapshot
        };
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(published).is_ok());
    }
}

/// Proof of holding the in-flight flag. Releases it on drop.
#[derive(Debug)]
pub struct CalculationGuard<'a> {
    session: &'a SessionState,
}

impl Drop for CalculationGuard<'_> {
    fn drop(&mut self) {
        self.session.in_flight.store(false, Ordering::Release);
        self.session.update(|s| s.is_calculating = false);
    }
}
