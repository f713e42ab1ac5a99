//! stat_sim - A headless duel demonstrating stat_engine
//!
//! This binary shows:
//! - Loading attribute and buff content from TOML (bundled or from a file)
//! - Building combatants from attribute-set definitions
//! - Buffs, debuffs, DoTs and status effects driven by a seeded RNG
//! - Event listeners observing everything the engine raises
//!
//! Usage: `stat_sim [content.toml] [--seed N] [--time-limit SECONDS]`
//! Set `RUST_LOG=stat_engine=debug,stat_sim=debug` for a full event trace.

mod encounter;

use anyhow::{Context, Result};
use clap::Parser;
use encounter::{Encounter, EncounterConfig, Fighter};
use stat_engine::prelude::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Run a seeded duel between a warrior and a mage
#[derive(Parser, Debug)]
#[command(name = "stat_sim", version, long_about = None)]
struct Options {
    /// Content file to load (defaults to the bundled content)
    #[arg(value_name = "CONTENT")]
    content: Option<PathBuf>,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Give up after this many simulated seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 120.0)]
    time_limit: f64,
}

impl Options {
    fn encounter_config(&self) -> EncounterConfig {
        EncounterConfig {
            seed: self.seed,
            time_limit: self.time_limit,
            ..EncounterConfig::default()
        }
    }
}

fn build_fighters(content: &Content) -> Result<(Fighter, Fighter)> {
    let warrior = content
        .build_attribute_set("warrior")
        .context("content has no 'warrior' attribute set")?;
    let mage = content
        .build_attribute_set("mage")
        .context("content has no 'mage' attribute set")?;

    let warrior = Fighter::new(Combatant::new(EntityId(1), "Warrior", warrior), "attack_power")
        .with_self_buffs(&["battle_shout", "fortify", "riposte"])
        .with_debuffs(&["bleed", "stun", "weakness"]);
    let mage = Fighter::new(Combatant::new(EntityId(2), "Mage", mage), "spell_power")
        .with_self_buffs(&["frost_armor", "regeneration", "divine_shield"])
        .with_debuffs(&["burn", "poison", "chill", "sleep"]);

    Ok((warrior, mage))
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("stat_engine=info".parse()?)
                .add_directive("stat_sim=info".parse()?),
        )
        .init();

    let options = Options::parse();

    let content = match &options.content {
        Some(path) => Content::load(path).with_context(|| format!("failed to load content from {}", path.display()))?,
        None => Content::with_defaults(),
    };
    info!(
        attributes = content.attributes.len(),
        buffs = content.buffs.len(),
        "content ready"
    );

    let (warrior, mage) = build_fighters(&content)?;
    let summary = Encounter::new(&content, options.encounter_config(), warrior, mage).run();

    match &summary.winner {
        Some(name) => println!("{name} wins after {:.1}s ({} actions)", summary.duration, summary.actions),
        None => println!("No winner after {:.1}s ({} actions)", summary.duration, summary.actions),
    }
    let stats = &summary.stats;
    println!(
        "buffs applied: {}, removed: {}, status changes: {}",
        stats.buffs_applied, stats.buffs_removed, stats.status_changes
    );
    println!(
        "tick damage: {:.1}, tick healing: {:.1}, depletions: {}",
        stats.tick_damage, stats.tick_healing, stats.depletions
    );

    Ok(())
}
