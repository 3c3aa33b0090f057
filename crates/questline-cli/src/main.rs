//! `questline`: drive the damage engine from JSON files.
//!
//! Quests come from a fixture file, trackers persist in a JSON store and
//! health is passed in on the command line and printed back out.

mod args;
mod fixture;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use questline_core::{
    Clock, DamageOrchestrator, DamageReport, FixedClock, InMemoryQuestProvider,
    JsonFileTrackerStore, PlayerHealth, QuestId, SystemClock,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("questline={0},questline_core={0},info", args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    args.validate()?;

    let config = fixture::load_config(args.config.as_deref())?;
    let quests = fixture::load_quests(&args.quests)?;
    let store = JsonFileTrackerStore::open(&args.store)
        .with_context(|| format!("failed to open tracker store {}", args.store.display()))?;
    let health = Arc::new(PlayerHealth::with_current(args.health, args.max_health));
    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock::new(now)),
        None => Arc::new(SystemClock),
    };

    info!(
        quests = quests.len(),
        store = %args.store.display(),
        cap = config.max_damage_per_session,
        "Starting questline"
    );

    let orchestrator = DamageOrchestrator::new(
        config,
        Arc::new(InMemoryQuestProvider::with_quests(quests)),
        Arc::new(store),
        health.clone(),
    )
    .context("invalid damage config")?
    .with_clock(clock);

    match args.command {
        Command::Run => {
            let report = orchestrator
                .calculate_and_apply_damage()
                .context("damage pass failed")?;
            print_report(&report);
        }
        Command::Fail { quest_id } => {
            let report = orchestrator
                .handle_quest_failed(&QuestId::new(quest_id))
                .context("failed to charge quest")?;
            print_report(&report);
        }
        Command::Complete { quest_id } => {
            let quest_id = QuestId::new(quest_id);
            orchestrator
                .handle_quest_completed(&quest_id)
                .context("failed to stop tracking quest")?;
            println!("stopped tracking {quest_id}");
        }
        Command::History { quest_id } => {
            let quest_id = QuestId::new(quest_id);
            let history = orchestrator.damage_history(&quest_id)?;
            let total = orchestrator.total_damage(&quest_id)?;
            println!("{quest_id}: {total} total damage");
            for event in history {
                println!(
                    "  {}  -{:<3} {}",
                    event.timestamp.format("%Y-%m-%d %H:%M"),
                    event.amount,
                    event.reason
                );
            }
        }
        Command::Cleanup => {
            let removed = orchestrator
                .cleanup_finished_quests()
                .context("cleanup failed")?;
            println!("removed {removed} tracker(s)");
        }
    }

    let state = health.state()?;
    println!("health: {}/{}", state.current, state.max);
    Ok(())
}

fn print_report(report: &DamageReport) {
    println!("{report}");
    for hit in &report.contributions {
        println!("  {}  -{:<3} {}", hit.quest_id, hit.damage, hit.reason);
    }
    for failure in &report.failures {
        println!("  {}  failed: {}", failure.quest_id, failure.error);
    }
    if let Some(err) = &report.health_error {
        println!("  health not updated: {err}");
    }
    if let Some(err) = report.first_error() {
        warn!(error = %err, "Pass finished with errors");
    }
}
