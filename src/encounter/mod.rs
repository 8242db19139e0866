//! Encounter orchestration: the game-loop glue around the combat core.

pub mod logic;
pub mod types;

pub use logic::*;
pub use types::*;
