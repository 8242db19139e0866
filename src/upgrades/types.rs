//! Upgrade record, cost table and derived gameplay values.

use crate::core::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four purchasable upgrades. Serialized names double as the keys of
/// the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeKind {
    Viscosity,
    Pigment,
    TetherTension,
    Absorbency,
}

impl UpgradeKind {
    /// Shop display order
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Viscosity,
        UpgradeKind::Pigment,
        UpgradeKind::TetherTension,
        UpgradeKind::Absorbency,
    ];

    /// Key in the persisted record
    pub fn key(&self) -> &'static str {
        match self {
            UpgradeKind::Viscosity => "viscosity",
            UpgradeKind::Pigment => "pigment",
            UpgradeKind::TetherTension => "tetherTension",
            UpgradeKind::Absorbency => "absorbency",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::Viscosity => "Viscosity",
            UpgradeKind::Pigment => "Pigment",
            UpgradeKind::TetherTension => "Tether Tension",
            UpgradeKind::Absorbency => "Absorbency",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UpgradeKind::Viscosity => "Extends bullet-time after a parry.",
            UpgradeKind::Pigment => "Increases stroke damage multiplier.",
            UpgradeKind::TetherTension => "Faster ink-tether swing and launch.",
            UpgradeKind::Absorbency => "Start each run with more HP.",
        }
    }

    pub fn stat_label(&self) -> &'static str {
        match self {
            UpgradeKind::Viscosity => "Bullet Time",
            UpgradeKind::Pigment => "Damage Mult",
            UpgradeKind::TetherTension => "Swing Speed",
            UpgradeKind::Absorbency => "Max HP",
        }
    }

    /// Current value of the stat this upgrade drives, formatted for the shop
    /// (e.g. "Bullet Time: 400ms").
    pub fn stat_text(&self, record: &UpgradeRecord) -> String {
        let value = match self {
            UpgradeKind::Viscosity => format!("{}ms", record.bullet_time_ms()),
            UpgradeKind::Pigment => format!("x{:.2}", record.damage_multiplier()),
            UpgradeKind::TetherTension => format!("x{:.2}", record.tether_speed_multiplier()),
            UpgradeKind::Absorbency => format!("{}", record.max_hit_points()),
        };
        format!("{}: {}", self.stat_label(), value)
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown upgrade key: {0:?}")]
pub struct UnknownUpgrade(pub String);

impl FromStr for UpgradeKind {
    type Err = UnknownUpgrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpgradeKind::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| UnknownUpgrade(s.to_string()))
    }
}

/// Account-wide progression, persisted as a flat record under
/// [`UPGRADE_SAVE_KEY`]. Missing keys deserialize to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpgradeRecord {
    pub(crate) viscosity: u8,
    pub(crate) pigment: u8,
    pub(crate) tether_tension: u8,
    pub(crate) absorbency: u8,
    /// Currency
    pub(crate) dropped_ink: u32,
}

impl UpgradeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh record holding `dropped_ink` currency.
    pub fn with_balance(dropped_ink: u32) -> Self {
        Self {
            dropped_ink,
            ..Self::default()
        }
    }

    pub fn level(&self, kind: UpgradeKind) -> u8 {
        match kind {
            UpgradeKind::Viscosity => self.viscosity,
            UpgradeKind::Pigment => self.pigment,
            UpgradeKind::TetherTension => self.tether_tension,
            UpgradeKind::Absorbency => self.absorbency,
        }
    }

    pub(crate) fn set_level(&mut self, kind: UpgradeKind, level: u8) {
        let level = level.min(MAX_UPGRADE_LEVEL);
        match kind {
            UpgradeKind::Viscosity => self.viscosity = level,
            UpgradeKind::Pigment => self.pigment = level,
            UpgradeKind::TetherTension => self.tether_tension = level,
            UpgradeKind::Absorbency => self.absorbency = level,
        }
    }

    pub fn balance(&self) -> u32 {
        self.dropped_ink
    }

    pub fn is_maxed(&self, kind: UpgradeKind) -> bool {
        self.level(kind) >= MAX_UPGRADE_LEVEL
    }

    /// Price of the next level, or None when maxed.
    pub fn next_cost(&self, kind: UpgradeKind) -> Option<u32> {
        upgrade_cost(self.level(kind))
    }

    /// Pull any out-of-range level (e.g. from a hand-edited save) back to
    /// the maximum.
    pub(crate) fn clamp_levels(&mut self) {
        for kind in UpgradeKind::ALL {
            self.set_level(kind, self.level(kind));
        }
    }

    pub fn bullet_time_ms(&self) -> u64 {
        bullet_time_ms(self.viscosity)
    }

    pub fn damage_multiplier(&self) -> f64 {
        damage_multiplier(self.pigment)
    }

    pub fn tether_speed_multiplier(&self) -> f64 {
        tether_speed_multiplier(self.tether_tension)
    }

    pub fn max_hit_points(&self) -> u32 {
        max_hit_points(self.absorbency)
    }
}

/// Cost to buy the level after `current_level`.
pub fn upgrade_cost(current_level: u8) -> Option<u32> {
    UPGRADE_COSTS.get(current_level as usize).copied()
}

pub fn bullet_time_ms(viscosity: u8) -> u64 {
    BULLET_TIME_BASE_MS + viscosity as u64 * BULLET_TIME_PER_LEVEL_MS
}

pub fn damage_multiplier(pigment: u8) -> f64 {
    1.0 + pigment as f64 * DAMAGE_MULT_PER_LEVEL
}

pub fn tether_speed_multiplier(tether_tension: u8) -> f64 {
    1.0 + tether_tension as f64 * TETHER_SPEED_PER_LEVEL
}

pub fn max_hit_points(absorbency: u8) -> u32 {
    PLAYER_BASE_HP + absorbency as u32 * HP_PER_ABSORBENCY_LEVEL
}

/// Successful purchase details, for shop feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub kind: UpgradeKind,
    pub new_level: u8,
    pub cost: u32,
    pub balance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("{kind} is already at max level")]
    MaxLevelReached { kind: UpgradeKind },
    #[error("{kind} costs {cost} ink but only {balance} is available")]
    InsufficientFunds {
        kind: UpgradeKind,
        cost: u32,
        balance: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_zero() {
        let record = UpgradeRecord::new();
        for kind in UpgradeKind::ALL {
            assert_eq!(record.level(kind), 0);
        }
        assert_eq!(record.balance(), 0);
    }

    #[test]
    fn test_upgrade_cost_table() {
        assert_eq!(upgrade_cost(0), Some(20));
        assert_eq!(upgrade_cost(1), Some(50));
        assert_eq!(upgrade_cost(2), Some(90));
        assert_eq!(upgrade_cost(3), Some(150));
        assert_eq!(upgrade_cost(4), None);
    }

    #[test]
    fn test_base_derived_values() {
        let record = UpgradeRecord::new();
        assert_eq!(record.bullet_time_ms(), 300);
        assert_eq!(record.damage_multiplier(), 1.0);
        assert_eq!(record.tether_speed_multiplier(), 1.0);
        assert_eq!(record.max_hit_points(), 100);
    }

    #[test]
    fn test_set_level_clamped_to_max() {
        let mut record = UpgradeRecord::new();
        record.set_level(UpgradeKind::Pigment, 9);
        assert_eq!(record.level(UpgradeKind::Pigment), MAX_UPGRADE_LEVEL);
        assert!(record.is_maxed(UpgradeKind::Pigment));
        assert_eq!(record.next_cost(UpgradeKind::Pigment), None);
    }

    #[test]
    fn test_kind_key_roundtrip() {
        for kind in UpgradeKind::ALL {
            assert_eq!(kind.key().parse::<UpgradeKind>(), Ok(kind));
        }
        assert_eq!(
            "ink".parse::<UpgradeKind>(),
            Err(UnknownUpgrade("ink".to_string()))
        );
    }

    #[test]
    fn test_record_serializes_flat_keys() {
        let mut record = UpgradeRecord::with_balance(12);
        record.set_level(UpgradeKind::TetherTension, 2);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "viscosity": 0,
                "pigment": 0,
                "tetherTension": 2,
                "absorbency": 0,
                "droppedInk": 12
            })
        );
    }

    #[test]
    fn test_stat_text() {
        let mut record = UpgradeRecord::new();
        record.set_level(UpgradeKind::Viscosity, 1);
        assert_eq!(
            UpgradeKind::Viscosity.stat_text(&record),
            "Bullet Time: 400ms"
        );
        assert_eq!(UpgradeKind::Pigment.stat_text(&record), "Damage Mult: x1.00");
        assert_eq!(UpgradeKind::Absorbency.stat_text(&record), "Max HP: 100");
    }
}
