//! Encounter data: skills, combatants, pacing config and presentation cues.

use crate::combat::{CombatPhase, IllegalTransition};
use crate::core::constants::*;
use crate::upgrades::{PurchaseError, UpgradeKind};
use crate::utils::persistence::{load_json_or_default, save_json, save_path};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// The strokes offered during the Strategy phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Slash,
    Guard,
    InkSurge,
}

impl Skill {
    pub const ALL: [Skill; 3] = [Skill::Slash, Skill::Guard, Skill::InkSurge];

    /// Action id reported through `ActionSelected`
    pub fn id(&self) -> &'static str {
        match self {
            Skill::Slash => "slash",
            Skill::Guard => "guard",
            Skill::InkSurge => "surgeInk",
        }
    }

    pub fn from_id(id: &str) -> Option<Skill> {
        Skill::ALL.into_iter().find(|skill| skill.id() == id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Skill::Slash => "Slash",
            Skill::Guard => "Guard",
            Skill::InkSurge => "Ink Surge",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Skill::Slash => "A precise ink blade.",
            Skill::Guard => "Brace for impact. Halves next hit.",
            Skill::InkSurge => "Channel raw ink. High damage, no parry window.",
        }
    }

    pub fn base_damage(&self) -> u32 {
        match self {
            Skill::Slash => SLASH_DAMAGE,
            Skill::Guard => GUARD_DAMAGE,
            Skill::InkSurge => INK_SURGE_DAMAGE,
        }
    }

    /// Whether the enemy's answering strike can be parried. Guard and Ink
    /// Surge both take the hit directly.
    pub fn allows_parry(&self) -> bool {
        matches!(self, Skill::Slash)
    }
}

/// `ceil(base * multiplier)`
pub fn scaled_damage(base: u32, multiplier: f64) -> u32 {
    (base as f64 * multiplier).ceil() as u32
}

pub fn enemy_max_hp(floor: u32) -> u32 {
    ENEMY_BASE_HP + floor.saturating_sub(1) * ENEMY_HP_PER_FLOOR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub hp: u32,
    pub max_hp: u32,
    /// Halves the next hit taken
    pub guarding: bool,
}

impl Combatant {
    pub fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            guarding: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Apply a hit, returning the damage actually taken. Consumes the guard.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let actual = if self.guarding {
            scaled_damage(amount, GUARD_DAMAGE_MULTIPLIER)
        } else {
            amount
        };
        self.guarding = false;
        self.hp = self.hp.saturating_sub(actual);
        actual
    }

    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn activate_guard(&mut self) {
        self.guarding = true;
    }
}

/// Pacing and timing knobs. Every field is optional in
/// `~/.inkflip/balance.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub parry_window_ms: u64,
    pub start_delay_ms: u64,
    pub guard_delay_ms: u64,
    pub attack_delay_ms: u64,
    pub enemy_windup_ms: u64,
    pub parry_resolve_delay_ms: u64,
    pub miss_resolve_delay_ms: u64,
    pub direct_hit_delay_ms: u64,
    pub enemy_death_delay_ms: u64,
    pub victory_delay_ms: u64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            parry_window_ms: PARRY_WINDOW_MS,
            start_delay_ms: COMBAT_START_DELAY_MS,
            guard_delay_ms: GUARD_DELAY_MS,
            attack_delay_ms: ATTACK_DELAY_MS,
            enemy_windup_ms: ENEMY_WINDUP_MS,
            parry_resolve_delay_ms: PARRY_RESOLVE_DELAY_MS,
            miss_resolve_delay_ms: MISS_RESOLVE_DELAY_MS,
            direct_hit_delay_ms: DIRECT_HIT_DELAY_MS,
            enemy_death_delay_ms: ENEMY_DEATH_DELAY_MS,
            victory_delay_ms: VICTORY_DELAY_MS,
        }
    }
}

impl EncounterConfig {
    pub const FILE_NAME: &'static str = "balance.json";

    /// Read `~/.inkflip/balance.json`, falling back to the built-in balance.
    pub fn load() -> Self {
        match save_path(Self::FILE_NAME) {
            Ok(path) => load_json_or_default(&path),
            Err(_) => Self::default(),
        }
    }

    /// Write to `~/.inkflip/balance.json` so it can be tweaked by hand.
    pub fn save(&self) -> io::Result<()> {
        save_json(&save_path(Self::FILE_NAME)?, self)
    }
}

/// What a tap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Parried,
    /// Missed or non-reaction tap: the player flips gravity instead
    Flipped,
    Ignored,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterCue {
    PhaseChanged { from: CombatPhase, to: CombatPhase },
    FloorEntered { floor: u32, enemy_hp: u32 },
    SkillUsed { skill: Skill },
    EnemyTelegraph,
    ParryWindowOpened,
    ParrySucceeded,
    ParryMissed,
    DamageDealt { target: Side, amount: u32, reflected: bool },
    BulletTimeStarted { duration_ms: u64, time_scale: f64 },
    BulletTimeEnded,
    GravityFlip,
    InkAwarded { amount: u32, balance: u32 },
    UpgradePurchased { kind: UpgradeKind, level: u8 },
    Defeated { side: Side },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncounterError {
    #[error(transparent)]
    Transition(#[from] IllegalTransition),
    #[error(transparent)]
    Purchase(#[from] PurchaseError),
    #[error("the shop is only open between floors (current phase: {0})")]
    ShopClosed(CombatPhase),
}
