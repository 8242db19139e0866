//! Simulation report generation.

use crate::upgrades::{UpgradeKind, UpgradeRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// Statistics from a single simulated run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub floors_cleared: u32,
    pub reached_target: bool,
    pub died: bool,
    pub timed_out: bool,
    pub elapsed_ms: u64,
    pub turns: u32,
    pub parry_windows: u32,
    pub parries: u32,
    pub misses: u32,
    pub damage_taken: u64,
    pub ink_earned: u32,
    pub upgrades_bought: u32,
    pub final_record: UpgradeRecord,
}

impl RunStats {
    pub fn parry_rate(&self) -> f64 {
        if self.parry_windows == 0 {
            0.0
        } else {
            self.parries as f64 / self.parry_windows as f64
        }
    }
}

fn mean(runs: &[RunStats], value: impl Fn(&RunStats) -> f64) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().map(value).sum::<f64>() / runs.len() as f64
}

/// Aggregated results from multiple simulation runs.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub num_runs: u32,
    pub target_floors: u32,
    pub runs_completed: u32,
    pub runs_died: u32,
    pub runs_timed_out: u32,

    pub avg_floors_cleared: f64,
    pub avg_turns: f64,
    pub avg_elapsed_ms: f64,
    pub avg_damage_taken: f64,
    pub avg_ink_earned: f64,

    /// Successful parries over all parry windows, across every run
    pub parry_rate: f64,

    /// Runs by number of floors cleared
    pub floor_distribution: BTreeMap<u32, u32>,

    /// Average final level per upgrade key
    pub avg_upgrade_levels: BTreeMap<String, f64>,

    #[serde(skip)]
    pub run_stats: Vec<RunStats>,
}

impl SimReport {
    /// Create a new report from completed run stats.
    pub fn from_runs(runs: Vec<RunStats>, target_floors: u32) -> Self {
        let num_runs = runs.len() as u32;

        let total_windows: u64 = runs.iter().map(|r| u64::from(r.parry_windows)).sum();
        let total_parries: u64 = runs.iter().map(|r| u64::from(r.parries)).sum();
        let parry_rate = if total_windows == 0 {
            0.0
        } else {
            total_parries as f64 / total_windows as f64
        };

        let mut floor_distribution = BTreeMap::new();
        for run in &runs {
            *floor_distribution.entry(run.floors_cleared).or_insert(0) += 1;
        }

        let avg_upgrade_levels = UpgradeKind::ALL
            .into_iter()
            .map(|kind| {
                let level = mean(&runs, |r| r.final_record.level(kind) as f64);
                (kind.key().to_string(), level)
            })
            .collect();

        let runs_completed = runs.iter().filter(|r| r.reached_target).count() as u32;
        let runs_died = runs.iter().filter(|r| r.died).count() as u32;
        let runs_timed_out = runs.iter().filter(|r| r.timed_out).count() as u32;
        let avg_floors_cleared = mean(&runs, |r| r.floors_cleared as f64);
        let avg_turns = mean(&runs, |r| r.turns as f64);
        let avg_elapsed_ms = mean(&runs, |r| r.elapsed_ms as f64);
        let avg_damage_taken = mean(&runs, |r| r.damage_taken as f64);
        let avg_ink_earned = mean(&runs, |r| r.ink_earned as f64);

        Self {
            num_runs,
            target_floors,
            runs_completed,
            runs_died,
            runs_timed_out,
            avg_floors_cleared,
            avg_turns,
            avg_elapsed_ms,
            avg_damage_taken,
            avg_ink_earned,
            parry_rate,
            floor_distribution,
            avg_upgrade_levels,
            run_stats: runs,
        }
    }

    pub fn completion_rate(&self) -> f64 {
        if self.num_runs == 0 {
            0.0
        } else {
            self.runs_completed as f64 / self.num_runs as f64 * 100.0
        }
    }

    /// Generate a text report.
    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                    SIMULATION REPORT\n");
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        report.push_str(&format!(
            "Runs: {} total, {} cleared {} floors, {} died, {} timed out\n\n",
            self.num_runs,
            self.runs_completed,
            self.target_floors,
            self.runs_died,
            self.runs_timed_out
        ));

        report.push_str("── PROGRESSION ──────────────────────────────────────────────────\n");
        report.push_str(&format!(
            "  Avg Floors Cleared:  {:.2}\n",
            self.avg_floors_cleared
        ));
        report.push_str(&format!("  Avg Turns:           {:.1}\n", self.avg_turns));
        report.push_str(&format!(
            "  Avg Run Length:      {:.1}s\n",
            self.avg_elapsed_ms / 1000.0
        ));
        report.push_str(&format!(
            "  Avg Damage Taken:    {:.0}\n\n",
            self.avg_damage_taken
        ));

        report.push_str("── PARRY ────────────────────────────────────────────────────────\n");
        report.push_str(&format!(
            "  Parry Rate:          {:.1}%\n\n",
            self.parry_rate * 100.0
        ));

        report.push_str("── ECONOMY ──────────────────────────────────────────────────────\n");
        report.push_str(&format!(
            "  Avg Ink Earned:      {:.0}\n",
            self.avg_ink_earned
        ));
        for kind in UpgradeKind::ALL {
            let level = self
                .avg_upgrade_levels
                .get(kind.key())
                .copied()
                .unwrap_or(0.0);
            report.push_str(&format!("  {:<19}  {:.2}\n", kind.name(), level));
        }
        report.push('\n');

        report.push_str("── FLOORS CLEARED ───────────────────────────────────────────────\n");
        for (floors, count) in &self.floor_distribution {
            let pct = *count as f64 / self.num_runs.max(1) as f64 * 100.0;
            let bar = "█".repeat((pct / 5.0) as usize);
            report.push_str(&format!("  {:3}: {:>5.1}% {}\n", floors, pct, bar));
        }
        report.push('\n');

        report.push_str("── BALANCE ASSESSMENT ───────────────────────────────────────────\n");
        report.push_str(&format!(
            "  Completion Rate: {:.1}%\n",
            self.completion_rate()
        ));
        if self.avg_floors_cleared < 2.0 {
            report.push_str("  ⚠️  Most runs end on the first floors - early enemies too strong?\n");
        }
        if self.parry_rate < 0.2 && self.num_runs > 0 {
            report.push_str("  ⚠️  Parries rarely land - window too tight for this reaction range?\n");
        }
        if self.runs_timed_out > 0 {
            report.push_str("  ⚠️  Some runs timed out - raise max run length?\n");
        }

        report.push_str("\n═══════════════════════════════════════════════════════════════\n");

        report
    }

    /// Generate a JSON report for further analysis.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
