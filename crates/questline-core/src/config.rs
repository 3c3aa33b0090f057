//! Damage configuration.
//!
//! Penalty constants are policy-level configuration: they are never
//! computed, only read. The defaults follow the game's balance sheet; the
//! flat penalties are larger than a single daily charge because they fire
//! less often.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a [`DamageConfig`] is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A penalty or the cap is zero.
    #[error("{0} must be positive")]
    NotPositive(&'static str),

    /// Two penalties share a value.
    #[error("penalties must be distinct: {0} and {1} are both {2}")]
    NotDistinct(&'static str, &'static str, u32),

    /// A flat penalty does not exceed the daily penalty.
    #[error("{0} ({1}) must exceed daily_per_day ({2})")]
    FlatTooSmall(&'static str, u32, u32),
}

/// Penalty constants and the per-session damage ceiling.
///
/// # Example
///
/// ```
/// use questline_core::config::DamageConfig;
///
/// let config: DamageConfig = serde_json::from_str(r#"{ "max_damage_per_session": 80 }"#).unwrap();
/// assert_eq!(config.max_damage_per_session, 80);
/// assert_eq!(config.daily_per_day, DamageConfig::default().daily_per_day);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Damage per missed calendar day of a daily quest.
    pub daily_per_day: u32,
    /// Flat damage for an overdue weekly quest.
    pub weekly_flat: u32,
    /// Flat damage for an overdue one-time quest.
    pub one_time_flat: u32,
    /// Damage per missed occurrence of a scheduled quest.
    pub scheduled_per_occurrence: u32,
    /// Ceiling on the damage applied by one orchestration pass.
    pub max_damage_per_session: u32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            daily_per_day: 5,
            weekly_flat: 15,
            one_time_flat: 20,
            scheduled_per_occurrence: 8,
            max_damage_per_session: 50,
        }
    }
}

impl DamageConfig {
    /// Checks the balance rules the policies rely on.
    ///
    /// # Errors
    ///
    /// Returns the first rule that does not hold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let penalties = [
            ("daily_per_day", self.daily_per_day),
            ("weekly_flat", self.weekly_flat),
            ("one_time_flat", self.one_time_flat),
            ("scheduled_per_occurrence", self.scheduled_per_occurrence),
            ("max_damage_per_session", self.max_damage_per_session),
        ];
        if let Some((name, _)) = penalties.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive(*name));
        }

        let per_kind = &penalties[..4];
        for (i, (a, va)) in per_kind.iter().enumerate() {
            if let Some((b, _)) = per_kind[i + 1..].iter().find(|(_, vb)| vb == va) {
                return Err(ConfigError::NotDistinct(*a, *b, *va));
            }
        }

        for (name, flat) in [
            ("weekly_flat", self.weekly_flat),
            ("one_time_flat", self.one_time_flat),
        ] {
            if flat <= self.daily_per_day {
                return Err(ConfigError::FlatTooSmall(name, flat, self.daily_per_day));
            }
        }
        Ok(())
    }
}
