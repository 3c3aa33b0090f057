//! Error taxonomy of the damage engine.
//!
//! Each collaborator seam has its own error type. [`DamageError`] is what
//! the orchestrator hands back to callers.

use thiserror::Error;

use crate::quest::QuestId;

/// Errors raised by a [`TrackerStore`](crate::store::TrackerStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// An event was appended to a tracker that was never created.
    #[error("no damage tracker for quest {0}")]
    TrackerNotFound(QuestId),

    /// Reading or writing the backing file failed.
    #[error("tracker store io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("tracker store serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("tracker store lock poisoned")]
    Poisoned,
}

/// Errors raised by a [`QuestProvider`](crate::provider::QuestProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider could not list or load quests.
    #[error("quest provider unavailable: {0}")]
    Unavailable(String),

    /// A previous writer panicked while holding the provider lock.
    #[error("quest provider lock poisoned")]
    Poisoned,
}

/// Errors raised by a [`HealthPool`](crate::health::HealthPool).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    /// The health pool refused or failed the mutation.
    #[error("health pool unavailable: {0}")]
    Unavailable(String),

    /// A previous writer panicked while holding the health lock.
    #[error("health pool lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the [`DamageOrchestrator`](crate::orchestrator::DamageOrchestrator).
#[derive(Debug, Error)]
pub enum DamageError {
    /// Another calculation holds the in-flight guard.
    #[error("damage calculation already in progress")]
    CalculationInProgress,

    /// The quest provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Tracker persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Applying damage to the health pool failed.
    #[error(transparent)]
    Health(#[from] HealthError),
}
