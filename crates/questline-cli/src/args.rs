//! Command line arguments.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Apply missed-quest damage to a player's health.
#[derive(Debug, Parser)]
#[command(name = "questline", version)]
pub struct Args {
    /// JSON file listing the player's quests
    #[arg(long, default_value = "quests.json")]
    pub quests: PathBuf,

    /// JSON file holding damage trackers (created if missing)
    #[arg(long, default_value = "trackers.json")]
    pub store: PathBuf,

    /// Optional JSON file overriding damage penalties and the session cap
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Player health before this run
    #[arg(long, default_value_t = 100)]
    pub health: u32,

    /// Maximum player health
    #[arg(long, default_value_t = 100)]
    pub max_health: u32,

    /// Log level for questline crates (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Evaluate as of this RFC 3339 instant instead of the system clock
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one damage pass over every active quest
    Run,
    /// Charge one quest immediately after it failed
    Fail {
        /// Quest identifier
        quest_id: String,
    },
    /// Stop tracking a completed quest
    Complete {
        /// Quest identifier
        quest_id: String,
    },
    /// Show a quest's damage history
    History {
        /// Quest identifier
        quest_id: String,
    },
    /// Remove trackers of finished quests
    Cleanup,
}

impl Args {
    /// Rejects argument combinations clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_health == 0 {
            bail!("--max-health must be positive");
        }
        if self.health > self.max_health {
            bail!(
                "--health ({}) exceeds --max-health ({})",
                self.health,
                self.max_health
            );
        }
        Ok(())
    }
}
