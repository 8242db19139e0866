//! Inkflip - parry-driven ink combat core
//!
//! This crate holds the platform-independent half of the game: the combat
//! phase state machine, the parry window, the persisted upgrade shop, the
//! encounter orchestrator that ties them together, and a headless balance
//! simulator built on top of it.

pub mod combat;
pub mod core;
pub mod encounter;
pub mod events;
pub mod parry;
pub mod simulator;
pub mod timer;
pub mod upgrades;
pub mod utils;
