//! Loading quests and damage config from JSON files.
//!
//! A quest file looks like:
//!
//! ```json
//! {
//!   "quests": [
//!     { "id": "stretch", "due_date": "2026-10-13T12:00:00Z", "recurrence": "daily" },
//!     { "id": "gym", "due_date": "2026-10-09T07:00:00Z", "recurrence": "scheduled",
//!       "weekdays": "MONDAY | WEDNESDAY" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use questline_core::{DamageConfig, QuestSnapshot};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct QuestFile {
    quests: Vec<QuestSnapshot>,
}

/// Parses a quest file body.
pub fn parse_quests(json: &str) -> Result<Vec<QuestSnapshot>> {
    let file: QuestFile = serde_json::from_str(json).context("invalid quest file")?;
    Ok(file.quests)
}

/// Reads the quest file at `path`.
pub fn load_quests(path: &Path) -> Result<Vec<QuestSnapshot>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read quests from {}", path.display()))?;
    let quests = parse_quests(&json).with_context(|| format!("in {}", path.display()))?;
    debug!(path = %path.display(), quests = quests.len(), "Loaded quests");
    Ok(quests)
}

/// Reads and validates the damage config, or returns the defaults.
pub fn load_config(path: Option<&Path>) -> Result<DamageConfig> {
    let config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("invalid damage config in {}", path.display()))?
        }
        None => DamageConfig::default(),
    };
    config.validate().context("damage config rejected")?;
    Ok(config)
}
