//! Health pool port.
//!
//! The orchestrator is the only caller of [`HealthPool::apply_damage`], and
//! it calls it at most once per pass with a positive amount.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::HealthError;

/// Shared player health.
pub trait HealthPool: Send + Sync {
    /// Subtracts `amount`, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation could not be applied.
    fn apply_damage(&self, amount: u32) -> Result<(), HealthError>;
}

/// Current and maximum health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    /// Current health.
    pub current: u32,
    /// Maximum health.
    pub max: u32,
}

/// A player's health pool.
///
/// Health never goes below zero and never exceeds `max`.
///
/// # Example
///
/// ```
/// use questline_core::health::{HealthPool, PlayerHealth};
///
/// let health = PlayerHealth::new(100);
/// health.apply_damage(130).unwrap();
/// assert_eq!(health.current().unwrap(), 0);
/// assert!(health.is_depleted().unwrap());
/// ```
#[derive(Debug)]
pub struct PlayerHealth {
    state: Mutex<HealthState>,
}

impl PlayerHealth {
    /// Creates a pool at full health.
    #[must_use]
    pub fn new(max: u32) -> Self {
        Self::with_current(max, max)
    }

    /// Creates a pool at `current` out of `max`, clamping `current` to `max`.
    #[must_use]
    pub fn with_current(current: u32, max: u32) -> Self {
        Self {
            state: Mutex::new(HealthState {
                current: current.min(max),
                max,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HealthState>, HealthError> {
        self.state.lock().map_err(|_| HealthError::Poisoned)
    }

    /// Returns current and maximum health.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Poisoned`] if the lock is poisoned.
    pub fn state(&self) -> Result<HealthState, HealthError> {
        Ok(*self.lock()?)
    }

    /// Returns current health.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Poisoned`] if the lock is poisoned.
    pub fn current(&self) -> Result<u32, HealthError> {
        Ok(self.lock()?.current)
    }

    /// Returns true if health reached zero.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Poisoned`] if the lock is poisoned.
    pub fn is_depleted(&self) -> Result<bool, HealthError> {
        Ok(self.lock()?.current == 0)
    }
}

impl HealthPool for PlayerHealth {
    fn apply_damage(&self, amount: u32) -> Result<(), HealthError> {
        let mut state = self.lock()?;
        state.current = state.current.saturating_sub(amount);
        Ok(())
    }
}
