//! # Questline Core
//!
//! Missed-quest damage tracking for Questline.
//!
//! Every recurring or one-off quest carries a damage tracker. A tracker
//! remembers how far the quest has already been assessed (its watermark),
//! how much damage it has caused so far and why. An orchestration pass
//! assesses every active quest since its watermark, clamps the sum to a
//! per-session cap and takes it off the player's health in one mutation.
//!
//! ## Architecture
//!
//! - **Policies**: one pure function per recurrence kind
//!   (daily, weekly, one-time, scheduled)
//! - **Trackers**: watermark, cumulative total and event history per quest,
//!   behind the [`TrackerStore`] trait
//! - **Orchestrator**: fans policy evaluation out across quests with rayon,
//!   fans the results back in and applies the capped total
//!
//! The quest list, the health pool and the clock are ports
//! ([`QuestProvider`], [`HealthPool`], [`Clock`]) so the engine can be
//! driven by anything from an app database to a JSON fixture.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use questline_core::{DamageConfig, DamageOrchestrator};
//!
//! let orchestrator = DamageOrchestrator::new(config, provider, store, health)?;
//! let report = orchestrator.calculate_and_apply_damage()?;
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod policy;
pub mod provider;
pub mod quest;
pub mod session;
pub mod store;
pub mod tracker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, DamageConfig};
pub use error::{DamageError, HealthError, ProviderError, StoreError};
pub use health::{HealthPool, HealthState, PlayerHealth};
pub use orchestrator::{DamageOrchestrator, DamageReport, QuestDamage, QuestFailure};
pub use policy::{DamageAssessment, DamagePolicy, PolicySet};
pub use provider::{InMemoryQuestProvider, QuestProvider};
pub use quest::{QuestId, QuestSnapshot, Recurrence, Weekdays};
pub use session::{SessionSnapshot, SessionState};
pub use store::{InMemoryTrackerStore, JsonFileTrackerStore, TrackerStore};
pub use tracker::{DamageEvent, DamageTracker};

#[cfg(test)]
mod tests;
