//! Persistent upgrade economy.
//!
//! Dropped ink earned by clearing floors buys levels in four upgrades, each
//! of which linearly scales one gameplay value. The record survives across
//! runs and is written through on every change.

pub mod logic;
pub mod persistence;
pub mod types;

pub use logic::*;
pub use persistence::*;
pub use types::*;
