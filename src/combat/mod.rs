//! Combat state machine: phases, turn and floor counters, transition events.

pub mod logic;
pub mod types;

pub use logic::*;
pub use types::*;
