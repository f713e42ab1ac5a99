//! Encounter - A seeded duel between two combatants built from content

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stat_engine::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

/// Simulation step in seconds
pub const STEP: f64 = 0.1;

/// Tunables for one encounter
#[derive(Debug, Clone)]
pub struct EncounterConfig {
    pub seed: u64,
    /// Give up after this many simulated seconds
    pub time_limit: f64,
    /// Chance per action to cast a debuff on the opponent
    pub debuff_chance: f64,
    /// Chance per action to cast a buff on self
    pub buff_chance: f64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        EncounterConfig {
            seed: 42,
            time_limit: 120.0,
            debuff_chance: 0.25,
            buff_chance: 0.15,
        }
    }
}

/// One side of the duel
#[derive(Debug)]
pub struct Fighter {
    pub combatant: Combatant,
    /// Attribute used as weapon/spell damage
    pub power_key: String,
    pub self_buffs: Vec<String>,
    pub debuffs: Vec<String>,
    action_timer: f64,
}

impl Fighter {
    pub fn new(combatant: Combatant, power_key: impl Into<String>) -> Self {
        Fighter {
            combatant,
            power_key: power_key.into(),
            self_buffs: Vec::new(),
            debuffs: Vec::new(),
            action_timer: 0.0,
        }
    }

    pub fn with_self_buffs(mut self, ids: &[&str]) -> Self {
        self.self_buffs = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_debuffs(mut self, ids: &[&str]) -> Self {
        self.debuffs = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Seconds between actions
    fn action_interval(&self) -> f64 {
        let speed = self.combatant.attributes().value("attack_speed");
        if speed > 0.0 {
            1.0 / speed
        } else {
            1.0
        }
    }
}

/// Running totals collected by an event listener
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncounterStats {
    pub buffs_applied: u32,
    pub buffs_removed: u32,
    pub tick_damage: f64,
    pub tick_healing: f64,
    pub status_changes: u32,
    pub depletions: u32,
}

impl EncounterStats {
    fn record(&mut self, event: &StatEvent) {
        match event {
            StatEvent::BuffApplied { .. } => self.buffs_applied += 1,
            StatEvent::BuffRemoved { .. } => self.buffs_removed += 1,
            StatEvent::BuffTicked { delta, .. } if *delta > 0.0 => self.tick_damage += delta,
            StatEvent::BuffTicked { delta, .. } => self.tick_healing -= delta,
            StatEvent::StatusEffectsChanged { .. } => self.status_changes += 1,
            StatEvent::ResourceDepleted { .. } => self.depletions += 1,
            _ => {}
        }
    }
}

/// Result of a finished encounter
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterSummary {
    /// `None` on timeout
    pub winner: Option<String>,
    pub duration: f64,
    pub actions: u32,
    pub stats: EncounterStats,
}

pub struct Encounter<'a> {
    content: &'a Content,
    config: EncounterConfig,
    fighters: [Fighter; 2],
    rng: ChaCha8Rng,
    bus: EventBus,
    stats: Rc<RefCell<EncounterStats>>,
    time: f64,
    actions: u32,
}

impl<'a> Encounter<'a> {
    pub fn new(content: &'a Content, config: EncounterConfig, first: Fighter, second: Fighter) -> Self {
        let stats = Rc::new(RefCell::new(EncounterStats::default()));
        let mut bus = EventBus::new();

        let recorder = Rc::clone(&stats);
        bus.subscribe(move |event| {
            recorder.borrow_mut().record(event);
            Subscription::Keep
        });
        bus.subscribe(|event| {
            debug!(?event, "event");
            Subscription::Keep
        });

        Encounter {
            content,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            fighters: [first, second],
            bus,
            stats,
            time: 0.0,
            actions: 0,
        }
    }

    /// Run until one side dies or the time limit passes
    pub fn run(mut self) -> EncounterSummary {
        info!(
            first = %self.fighters[0].combatant.name,
            second = %self.fighters[1].combatant.name,
            seed = self.config.seed,
            "encounter started"
        );

        while self.time < self.config.time_limit && self.fighters.iter().all(|f| f.combatant.is_alive()) {
            self.step();
        }

        let winner = match (self.fighters[0].combatant.is_alive(), self.fighters[1].combatant.is_alive()) {
            (true, false) => Some(self.fighters[0].combatant.name.clone()),
            (false, true) => Some(self.fighters[1].combatant.name.clone()),
            _ => None,
        };
        let summary = EncounterSummary {
            winner,
            duration: self.time,
            actions: self.actions,
            stats: self.stats.borrow().clone(),
        };
        info!(winner = ?summary.winner, duration = summary.duration, actions = summary.actions, "encounter finished");
        summary
    }

    /// Advance one fixed step
    pub fn step(&mut self) {
        self.time += STEP;
        for fighter in &mut self.fighters {
            fighter.combatant.update(STEP);
        }

        for index in 0..self.fighters.len() {
            let fighter = &mut self.fighters[index];
            if !fighter.combatant.is_alive() || !fighter.combatant.status().can_act() {
                continue;
            }
            fighter.action_timer -= STEP;
            if fighter.action_timer > 0.0 {
                continue;
            }
            fighter.action_timer += fighter.action_interval();
            self.act(index);
        }

        for fighter in &mut self.fighters {
            let events = fighter.combatant.drain_events();
            self.bus.dispatch(&events);
        }
    }

    fn act(&mut self, index: usize) {
        self.actions += 1;
        let [first, second] = &mut self.fighters;
        let (actor, target) = if index == 0 { (first, second) } else { (second, first) };
        let status = actor.combatant.status();
        let roll: f64 = self.rng.gen();

        if roll < self.config.debuff_chance && status.can_cast() {
            if let Some(definition) = actor.debuffs.choose(&mut self.rng).and_then(|id| self.content.buff(id)) {
                let applied = target.combatant.apply_buff(definition, actor.combatant.id);
                debug!(actor = %actor.combatant.name, buff = %definition.id, applied = applied.is_some(), "cast debuff");
                return;
            }
        }

        if roll < self.config.debuff_chance + self.config.buff_chance && status.can_cast() {
            if let Some(definition) = actor.self_buffs.choose(&mut self.rng).and_then(|id| self.content.buff(id)) {
                actor.combatant.apply_buff(definition, actor.combatant.id);
                debug!(actor = %actor.combatant.name, buff = %definition.id, "cast buff");
                return;
            }
        }

        if !status.can_attack() {
            return;
        }
        let power = actor.combatant.attributes().value(&actor.power_key);
        let armour = target.combatant.attributes().value("armour");
        let raw = power * self.rng.gen_range(0.8..1.2);
        let damage = raw * 100.0 / (100.0 + armour.max(0.0));
        let dealt = target.combatant.take_damage(damage);

        // Attack-bound charges
        for id in actor.self_buffs.clone() {
            actor.combatant.consume_use(&id);
        }

        debug!(
            actor = %actor.combatant.name,
            target = %target.combatant.name,
            dealt,
            remaining = target.combatant.health(),
            "attack"
        );
    }
}
