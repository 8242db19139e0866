//! Parry window: a timed, cancelable window for a single reaction input.

pub mod logic;
pub mod types;

pub use logic::*;
pub use types::*;
