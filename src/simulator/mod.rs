//! Balance simulator for Monte Carlo analysis.
//!
//! Plays thousands of headless runs to analyze:
//! - How deep a run gets before the player falls
//! - Parry success rate against a given reaction-time spread
//! - Ink income and which upgrades it buys
//!
//! Runs drive [`Encounter`](crate::encounter::Encounter) directly, so results
//! follow the real combat rules.

mod config;
mod report;
mod runner;

pub use config::SimConfig;
pub use report::{RunStats, SimReport};
pub use runner::{run_simulation, simulate_single_run};
