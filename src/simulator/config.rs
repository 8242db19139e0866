//! Simulation configuration.

use crate::core::constants::REALTIME_FRAME_MS;
use crate::encounter::{EncounterConfig, Skill};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of simulation runs to perform
    pub num_runs: u32,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,

    /// Floors to clear before a run counts as complete
    pub max_floors: u32,

    /// Simulated frame length fed to `Encounter::update`
    pub frame_ms: u64,

    /// Fastest reaction after a parry window opens
    pub min_reaction_ms: u64,

    /// Slowest reaction after a parry window opens
    pub max_reaction_ms: u64,

    /// Relative odds of picking each skill, in `Skill::ALL` order
    pub skill_weights: [u32; 3],

    /// Game-clock budget per run before timeout
    pub max_ms_per_run: u64,

    /// Pacing used by every encounter
    pub encounter: EncounterConfig,

    /// Log verbosity (0 = silent, 1 = summary, 2 = per run)
    pub verbosity: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_runs: 1000,
            seed: None,
            max_floors: 10,
            frame_ms: REALTIME_FRAME_MS,
            min_reaction_ms: 120,
            max_reaction_ms: 260,
            skill_weights: [6, 2, 2],
            max_ms_per_run: 30 * 60 * 1000,
            encounter: EncounterConfig::default(),
            verbosity: 1,
        }
    }
}

impl SimConfig {
    /// A player who always taps inside the window and only ever slashes.
    pub fn perfect_parry() -> Self {
        Self {
            num_runs: 100,
            min_reaction_ms: 20,
            max_reaction_ms: 80,
            skill_weights: [1, 0, 0],
            ..Default::default()
        }
    }

    /// A slow player who mostly misses.
    pub fn sluggish() -> Self {
        Self {
            num_runs: 100,
            min_reaction_ms: 180,
            max_reaction_ms: 400,
            ..Default::default()
        }
    }

    /// Quick config for smoke checks
    pub fn quick(num_runs: u32) -> Self {
        Self {
            num_runs,
            max_floors: 5,
            ..Default::default()
        }
    }

    /// Reaction range with the bounds in order.
    pub fn reaction_range(&self) -> (u64, u64) {
        if self.min_reaction_ms <= self.max_reaction_ms {
            (self.min_reaction_ms, self.max_reaction_ms)
        } else {
            (self.max_reaction_ms, self.min_reaction_ms)
        }
    }

    pub fn skill_weight(&self, skill: Skill) -> u32 {
        Skill::ALL
            .iter()
            .position(|s| *s == skill)
            .map_or(0, |i| self.skill_weights[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_range_is_ordered() {
        let config = SimConfig {
            min_reaction_ms: 300,
            max_reaction_ms: 100,
            ..Default::default()
        };
        assert_eq!(config.reaction_range(), (100, 300));
        assert_eq!(SimConfig::default().reaction_range(), (120, 260));
    }

    #[test]
    fn test_perfect_parry_only_slashes() {
        let config = SimConfig::perfect_parry();
        assert_eq!(config.skill_weight(Skill::Slash), 1);
        assert_eq!(config.skill_weight(Skill::Guard), 0);
        assert_eq!(config.skill_weight(Skill::InkSurge), 0);
    }
}
