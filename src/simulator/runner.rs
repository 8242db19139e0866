//! Simulation runner driving real encounters with a simulated player.

use super::config::SimConfig;
use super::report::{RunStats, SimReport};
use crate::combat::CombatPhase;
use crate::encounter::{Encounter, EncounterCue, Side, Skill};
use crate::upgrades::{cheapest_affordable, MemoryStorage, UpgradeStore};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Run the full simulation and return a report.
pub fn run_simulation(config: &SimConfig) -> SimReport {
    let mut all_runs = Vec::with_capacity(config.num_runs as usize);

    for run_idx in 0..config.num_runs {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(run_idx as u64)),
            None => ChaCha8Rng::from_entropy(),
        };

        let stats = simulate_single_run(config, &mut rng);
        if config.verbosity >= 2 {
            info!(
                run = run_idx + 1,
                of = config.num_runs,
                floors = stats.floors_cleared,
                died = stats.died,
                parries = stats.parries,
                windows = stats.parry_windows,
                ink = stats.ink_earned,
                "run finished"
            );
        }
        all_runs.push(stats);
    }

    SimReport::from_runs(all_runs, config.max_floors)
}

/// Play one run from floor 1 until death, `max_floors` cleared or timeout.
pub fn simulate_single_run(config: &SimConfig, rng: &mut ChaCha8Rng) -> RunStats {
    let store = UpgradeStore::new(MemoryStorage::new());
    let mut encounter = Encounter::new(config.encounter.clone(), store);
    let cues = encounter.cue_queue();
    let skills = WeightedIndex::new(config.skill_weights).ok();
    let (min_reaction, max_reaction) = config.reaction_range();
    let frame_ms = config.frame_ms.max(1);

    let mut stats = RunStats::default();
    let mut tap_at: Option<u64> = None;

    loop {
        if encounter.now_ms() >= config.max_ms_per_run {
            stats.timed_out = true;
            break;
        }

        match encounter.phase() {
            CombatPhase::GameOver => {
                stats.died = true;
                break;
            }
            CombatPhase::Strategy => {
                let skill = skills
                    .as_ref()
                    .map_or(Skill::Slash, |dist| Skill::ALL[dist.sample(rng)]);
                if let Err(e) = encounter.select_skill(skill) {
                    debug!(error = %e, "simulated skill rejected");
                }
            }
            CombatPhase::Shop => {
                if stats.floors_cleared >= config.max_floors {
                    stats.reached_target = true;
                    break;
                }
                while let Some(kind) = cheapest_affordable(encounter.record()) {
                    if encounter.purchase(kind).is_err() {
                        break;
                    }
                    stats.upgrades_bought += 1;
                }
                if let Err(e) = encounter.close_shop() {
                    debug!(error = %e, "simulated shop close rejected");
                }
            }
            _ => {}
        }

        let now = encounter.now_ms();
        if let Some(at) = tap_at {
            if now >= at {
                encounter.tap();
                tap_at = None;
            }
        }

        // Step exactly onto a pending tap so reaction times are not rounded
        // up to the frame length.
        let step = match tap_at {
            Some(at) if at > now => frame_ms.min(at - now),
            _ => frame_ms,
        };
        encounter.update(step);

        for cue in cues.drain() {
            match cue {
                EncounterCue::ParryWindowOpened => {
                    stats.parry_windows += 1;
                    let reaction = rng.gen_range(min_reaction..=max_reaction);
                    let opened_at = encounter
                        .parry_state()
                        .deadline_ms
                        .map_or(encounter.now_ms(), |deadline| {
                            deadline.saturating_sub(config.encounter.parry_window_ms)
                        });
                    tap_at = Some(opened_at + reaction);
                }
                EncounterCue::ParrySucceeded => stats.parries += 1,
                EncounterCue::ParryMissed => {
                    stats.misses += 1;
                    tap_at = None;
                }
                EncounterCue::SkillUsed { .. } => stats.turns += 1,
                EncounterCue::DamageDealt {
                    target: Side::Player,
                    amount,
                    ..
                } => stats.damage_taken += u64::from(amount),
                EncounterCue::InkAwarded { amount, .. } => {
                    stats.floors_cleared += 1;
                    stats.ink_earned += amount;
                }
                _ => {}
            }
        }
    }

    stats.elapsed_ms = encounter.now_ms();
    stats.final_record = encounter.record().clone();
    stats
}
